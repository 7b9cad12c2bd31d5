// Query-string escaping
//
// `:`, `,` and `|` stay literal so chart URLs remain readable.

/// Characters left unescaped on top of the always-safe set
pub const SAFE: &str = "/:,|";

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-')
}

/// Percent-encode `input`, turning spaces into `+`.
pub fn quote_plus(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte == b' ' {
            out.push('+');
        } else if is_unreserved(byte) || SAFE.as_bytes().contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Encode `key=value` pairs joined with `&`, in iteration order.
pub fn urlencode<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", quote_plus(k), quote_plus(v)))
        .collect::<Vec<_>>()
        .join("&")
}
