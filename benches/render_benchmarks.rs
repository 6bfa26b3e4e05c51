#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jxml::{to_xml, Document, Element, IndentStyle, Node, Options};

fn catalog(rows: usize) -> Node {
    let items = (0..rows)
        .map(|i| {
            Node::element(
                "item",
                Node::list([
                    Node::attrs([("id", i.to_string())]),
                    Node::element("name", format!("item & {i}")),
                    Node::element("note", Node::cdata("<raw>")),
                ]),
            )
        })
        .collect::<Vec<_>>();
    Node::element("catalog", items)
}

fn bench_to_xml(c: &mut Criterion) {
    let input = catalog(1_000);
    let indented = Options::default().indent(IndentStyle::Spaces);

    c.bench_function("to_xml", |b| {
        b.iter(|| to_xml(black_box(input.clone()), &Options::default()).unwrap())
    });
    c.bench_function("to_xml_indented", |b| {
        b.iter(|| to_xml(black_box(input.clone()), &indented).unwrap())
    });
}

fn bench_deferred_push(c: &mut Criterion) {
    let row = Node::element("row", Node::list([Node::element("a", 1), Node::element("b", 2)]));

    c.bench_function("deferred_push", |b| {
        b.iter(|| {
            let rows = Element::new(Node::Null);
            let doc = Document::new(Options::default());
            doc.write(Node::element("rows", &rows)).unwrap();
            for _ in 0..1_000 {
                rows.push(black_box(row.clone())).unwrap();
            }
            rows.close().unwrap();
            doc.into_string().unwrap()
        })
    });
}

criterion_group!(benches, bench_to_xml, bench_deferred_push);
criterion_main!(benches);
