//! A paged query cursor over one connection.

use std::io;

use bson;

use connection::Connection;
use error::Result;
use stream::Stream;
use wire_protocol::flags::OpQueryFlags;
use wire_protocol::operations::Message;

/// Documents requested per page.
pub const DEFAULT_BATCH_SIZE: i32 = 100;

// The request staged for the next page.
enum Page {
    Query,
    GetMore,
}

/// Iterates the documents of a query, sending OP_GETMORE requests as
/// pages drain until the server reports the cursor exhausted.
///
/// The cursor borrows its connection exclusively: it is the only user of
/// the socket until it is dropped. Dropping it never closes the
/// connection.
pub struct Cursor<'a, S: Stream + 'a = ::std::net::TcpStream> {
    connection: &'a mut Connection<S>,
    namespace: String,
    query: Vec<u8>,
    fields: Option<Vec<u8>>,
    batch_size: i32,
    page: Page,
    cursor_id: i64,
    documents: Vec<u8>,
    position: usize,
    has_sent: bool,
    is_done: bool,
    has_error: bool,
}

impl<'a, S: Stream> Cursor<'a, S> {
    /// Prepares a cursor over `collection`. Nothing is sent until the
    /// first `move_next`.
    pub fn new(
        connection: &'a mut Connection<S>,
        collection: &str,
        query: &bson::Document,
        fields: Option<&bson::Document>,
    ) -> Result<Cursor<'a, S>> {
        let mut query_bytes = Vec::new();
        bson::encode_document(&mut query_bytes, query)?;

        let fields_bytes = match fields {
            Some(fields) => {
                let mut bytes = Vec::new();
                bson::encode_document(&mut bytes, fields)?;
                Some(bytes)
            }
            None => None,
        };

        Ok(Cursor {
            connection: connection,
            namespace: collection.to_owned(),
            query: query_bytes,
            fields: fields_bytes,
            batch_size: DEFAULT_BATCH_SIZE,
            page: Page::Query,
            cursor_id: 0,
            documents: Vec::new(),
            position: 0,
            has_sent: false,
            is_done: false,
            has_error: false,
        })
    }

    /// Whether the cursor stopped because of a failure rather than
    /// exhaustion.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// The latest cursor id the server reported.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Returns the next document, requesting further pages from the
    /// server as needed. `None` means the cursor is exhausted, or that it
    /// failed; `has_error` tells the two apart.
    pub fn move_next(&mut self) -> Option<bson::Document> {
        loop {
            if self.is_done || self.has_error {
                return None;
            }

            if !self.has_sent {
                if !self.request_page() {
                    self.has_error = true;
                    return None;
                }
                self.has_sent = true;
            }

            if self.position < self.documents.len() {
                let mut reader = io::Cursor::new(&self.documents[self.position..]);
                match bson::decode_document(&mut reader) {
                    Ok(document) => {
                        self.position += reader.position() as usize;
                        return Some(document);
                    }
                    Err(err) => {
                        warn!("Failed to decode reply document: {}", err);
                        self.has_error = true;
                        return None;
                    }
                }
            }

            // The page is drained. An empty page ends the cursor, as does
            // a zero cursor id; otherwise stage a getmore and go around.
            if self.documents.is_empty() || self.cursor_id == 0 {
                self.is_done = true;
                return None;
            }

            self.page = Page::GetMore;
            self.has_sent = false;
            self.documents.clear();
            self.position = 0;
        }
    }

    // Sends the staged request and buffers the reply's document region.
    fn request_page(&mut self) -> bool {
        let sent = {
            let mut request = match self.page {
                Page::Query => match Message::new_query(
                    OpQueryFlags::no_flags(),
                    &self.namespace,
                    0,
                    self.batch_size,
                    &self.query,
                    self.fields.as_ref().map(|bytes| &bytes[..]),
                ) {
                    Ok(request) => request,
                    Err(_) => return false,
                },
                Page::GetMore => {
                    match Message::new_get_more(&self.namespace, self.batch_size, self.cursor_id) {
                        Ok(request) => request,
                        Err(_) => return false,
                    }
                }
            };
            self.connection.send(&mut request).is_ok()
        };
        if !sent {
            return false;
        }

        match self.connection.recv() {
            Ok(Message::OpReply {
                cursor_id,
                documents,
                ..
            }) => {
                self.cursor_id = cursor_id;
                self.documents = documents.to_vec();
                self.position = 0;
                true
            }
            Ok(_) => false,
            Err(_) => false,
        }
    }
}

impl<'a, S: Stream> Iterator for Cursor<'a, S> {
    type Item = bson::Document;

    fn next(&mut self) -> Option<bson::Document> {
        self.move_next()
    }
}
