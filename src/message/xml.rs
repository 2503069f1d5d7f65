/// `<name><![CDATA[value]]></name>`; a `]]>` inside the value is split over two sections
pub fn cdata_element(name: &str, value: &str) -> String {
    format!(
        "<{name}><![CDATA[{}]]></{name}>",
        value.replace("]]>", "]]]]><![CDATA[>")
    )
}

/// `<name>value</name>` with the xml special characters escaped
pub fn plain_element(name: &str, value: &str) -> String {
    format!("<{name}>{}</{name}>", escape(value))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cdata_terminator_is_split() {
        assert_eq!(
            cdata_element("Content", "a]]>b"),
            "<Content><![CDATA[a]]]]><![CDATA[>b]]></Content>"
        );
    }

    #[test]
    fn plain_values_are_escaped() {
        assert_eq!(plain_element("MsgId", "1<2&3"), "<MsgId>1&lt;2&amp;3</MsgId>");
    }
}
