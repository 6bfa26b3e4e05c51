//! Character escaping for text, attribute values and CDATA sections

/// Replaces `& " ' < >` with their named entities.
///
/// Not idempotent: escaping already escaped text escapes the `&` again.
pub fn escape(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Wraps raw text in a CDATA section.
///
/// Every `]]>` is split across two abutting sections so the result stays
/// valid CDATA.
pub fn cdata(raw: &str) -> String {
    format!("<![CDATA[{}]]>", raw.replace("]]>", "]]]]><![CDATA[>"))
}

/// Renders one `key="value"` attribute fragment
pub fn attribute(key: &str, value: &str) -> String {
    format!("{key}=\"{}\"", escape(value))
}
