#![allow(dead_code)]

//! Shared builders for interface-description documents used across the
//! integration tests.

use busbindc::compile::{compile_document, CompileOptions, CompileOutput};
use busbindc::model::NodeBindingSet;

pub const NODE_ATTRS: &str =
    r#"dest="com.example" name="/com/example/Foo" cppname="com.example.Foo""#;

pub fn node(attrs: &str, body: &str) -> String {
    format!("<node {attrs}>\n{body}\n</node>\n")
}

/// One node, one interface (`com.example.Foo`), the given interface body.
pub fn doc(interface_body: &str) -> String {
    node(
        NODE_ATTRS,
        &format!("<interface name=\"com.example.Foo\">\n{interface_body}\n</interface>"),
    )
}

pub fn compile(xml: &str) -> CompileOutput {
    compile_document(xml, &CompileOptions::default()).expect("document must compile")
}

/// Compile a document expected to produce exactly one binding set.
pub fn compile_single(xml: &str) -> (NodeBindingSet, CompileOutput) {
    let output = compile(xml);
    assert_eq!(
        output.model.nodes.len(),
        1,
        "expected exactly one node binding set"
    );
    (output.model.nodes[0].clone(), output)
}
