pub(crate) mod backoff;
pub(crate) mod clientstate;
pub(crate) mod compression;
pub(crate) mod message_processor;
pub(crate) mod nextmessage;
