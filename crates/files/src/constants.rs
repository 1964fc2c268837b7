/// Media type recorded when none is declared and the content cannot be sniffed.
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

pub(crate) const DATA_URI_SCHEME: &str = "data:";

pub(crate) const BASE64_MARKER: &str = ";base64";
