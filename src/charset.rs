//! Character encodings understood by the archive proxy.
//!
//! Entry names inside zip and tar archives are not always UTF-8. The proxy
//! decodes them with the encoding named in the `charset` query parameter; this
//! client never interprets the value itself, it only restricts it to the set
//! the proxy accepts.

/// Encoding used when none is given.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Every encoding name the proxy accepts.
pub const CHARSETS: &[&str] = &[
    "utf-8",
    "gbk",
    "gb18030",
    "big5",
    "euc-jp",
    "iso-2022-jp",
    "shift-jis",
    "euc-kr",
    "utf-16be",
    "utf-16le",
    "koi8-r",
    "koi8-u",
    "cp437",
    "ibm866",
    "macintosh",
    "iso-8859-2",
    "iso-8859-3",
    "iso-8859-4",
    "iso-8859-5",
    "iso-8859-6",
    "iso-8859-7",
    "iso-8859-8",
    "iso-8859-10",
    "iso-8859-13",
    "iso-8859-14",
    "iso-8859-15",
    "iso-8859-16",
    "windows-874",
    "windows-1250",
    "windows-1251",
    "windows-1252",
    "windows-1253",
    "windows-1254",
    "windows-1255",
    "windows-1256",
    "windows-1257",
    "windows-1258",
    "x-mac-cyrillic",
    "x-user-defined",
];

pub fn is_supported(name: &str) -> bool {
    CHARSETS.contains(&name)
}
