//! Operation flags for the legacy wire protocol.

bitflags! {
    /// Bit vector of options in an OP_REPLY.
    pub struct OpReplyFlags: i32 {
        const CURSOR_NOT_FOUND   = 1;
        const QUERY_FAILURE      = 1 << 1;
        const SHARD_CONFIG_STALE = 1 << 2;
        const AWAIT_CAPABLE      = 1 << 3;
    }
}

bitflags! {
    /// Bit vector of options in an OP_QUERY.
    pub struct OpQueryFlags: i32 {
        const TAILABLE_CURSOR   = 1 << 1;
        const SLAVE_OK          = 1 << 2;
        const OPLOG_REPLAY      = 1 << 3;
        const NO_CURSOR_TIMEOUT = 1 << 4;
        const AWAIT_DATA        = 1 << 5;
        const EXHAUST           = 1 << 6;
        const PARTIAL           = 1 << 7;
    }
}

bitflags! {
    /// Bit vector of options in an OP_UPDATE.
    pub struct OpUpdateFlags: i32 {
        const UPSERT       = 1;
        const MULTI_UPDATE = 1 << 1;
    }
}

bitflags! {
    /// Bit vector of options in an OP_INSERT.
    pub struct OpInsertFlags: i32 {
        const CONTINUE_ON_ERROR = 1;
    }
}

bitflags! {
    /// Bit vector of options in an OP_DELETE.
    pub struct OpDeleteFlags: i32 {
        const SINGLE_REMOVE = 1;
    }
}

impl OpReplyFlags {
    pub fn no_flags() -> OpReplyFlags {
        OpReplyFlags::empty()
    }
}

impl OpQueryFlags {
    pub fn no_flags() -> OpQueryFlags {
        OpQueryFlags::empty()
    }
}

impl OpUpdateFlags {
    pub fn no_flags() -> OpUpdateFlags {
        OpUpdateFlags::empty()
    }
}

impl OpInsertFlags {
    pub fn no_flags() -> OpInsertFlags {
        OpInsertFlags::empty()
    }
}

impl OpDeleteFlags {
    pub fn no_flags() -> OpDeleteFlags {
        OpDeleteFlags::empty()
    }
}
