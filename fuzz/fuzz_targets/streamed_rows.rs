#![no_main]
use jxml::{to_xml, Document, Element, Node, Options};
use libfuzzer_sys::fuzz_target;

// Pushing each array value as a <row> must match the up-front rendering
fuzz_target!(|data: &[u8]| {
    let Ok(serde_json::Value::Array(values)) = serde_json::from_slice(data) else {
        return;
    };
    let rows: Vec<Node> = values
        .into_iter()
        .map(|value| Node::element("row", Node::from(value)))
        .collect();
    let Ok(expected) = to_xml(Node::element("t", rows.clone()), &Options::default()) else {
        return;
    };

    let table = Element::new(Node::Null);
    let doc = Document::new(Options::default());
    if doc.write(Node::element("t", &table)).is_err() {
        return;
    }
    for row in rows {
        let _ = table.push(row);
    }
    let _ = table.close();
    if let Ok(streamed) = doc.into_string() {
        assert_eq!(streamed, expected);
    }
});
