use busbindc::compile::{compile_document, CompileErrorKind, CompileOptions};
use busbindc::diagnostics::{Severity, Stage};
use busbindc::model::{Instruction, MethodKind, SlotKind};

mod introspection_doc;
use introspection_doc::{compile_single, doc};

#[test]
fn method_without_name_contributes_nothing() {
    let xml = doc(
        r#"<method>
             <arg name="x" type="i" direction="in"/>
           </method>"#,
    );
    let (set, output) = compile_single(&xml);

    // Only the factory methods every node carries.
    assert_eq!(set.proxy.methods.len(), 1);
    assert_eq!(set.proxy.methods[0].name, "create");
    assert!(set.proxy.members.is_empty());
    assert_eq!(set.adapter.methods.len(), 2);
    assert!(set.adaptee.methods.is_empty());
    assert!(set.proxy.constructor.expect("proxy ctor").instructions.is_empty());
    assert!(set.adapter.constructor.expect("adapter ctor").instructions.is_empty());

    assert_eq!(output.report.diagnostics.len(), 1);
    let diagnostic = &output.report.diagnostics[0];
    assert_eq!(diagnostic.code, "BBC-METHOD-0001");
    assert_eq!(diagnostic.severity, Severity::Error);
    assert!(!output.report.ok);
}

#[test]
fn method_is_wired_into_all_three_descriptors() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="name" type="s" direction="in"/>
             <arg name="result" type="s" direction="out"/>
           </method>"#,
    );
    let (set, output) = compile_single(&xml);
    assert!(output.report.ok, "unexpected diagnostics: {:?}", output.report.diagnostics);

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert_eq!(forward.kind, MethodKind::Instance);
    assert_eq!(forward.args.len(), 1);
    assert_eq!(forward.args[0].name, "name");
    assert_eq!(forward.ret.as_ref().expect("return type").render(), "String");
    assert_eq!(
        forward.body,
        vec![Instruction::ForwardCall {
            slot: "method_Bar".to_string(),
            args: vec!["name".to_string()],
            returns: true,
        }]
    );

    let slot = set.proxy.member("method_Bar").expect("bound call slot");
    assert_eq!(slot.kind, SlotKind::MethodHandle);
    assert_eq!(slot.args.len(), 1);
    assert_eq!(slot.ret.as_ref().expect("slot return type").render(), "String");

    let proxy_ctor = set.proxy.constructor.expect("proxy ctor");
    assert_eq!(
        proxy_ctor.instructions,
        vec![Instruction::RegisterMethod {
            slot: "method_Bar".to_string(),
            interface: "com.example.Foo".to_string(),
            method: "Bar".to_string(),
        }]
    );

    let adapter_ctor = set.adapter.constructor.expect("adapter ctor");
    assert_eq!(
        adapter_ctor.instructions,
        vec![
            Instruction::BindMethod {
                interface: "com.example.Foo".to_string(),
                method: "Bar".to_string(),
                operation: "Bar".to_string(),
            },
            Instruction::SetArgName {
                ordinal: 0,
                name: "result".to_string(),
            },
            Instruction::SetArgName {
                ordinal: 1,
                name: "name".to_string(),
            },
        ]
    );

    let operation = set.adaptee.method("Bar").expect("adaptee operation");
    assert_eq!(operation.kind, MethodKind::Abstract);
    assert_eq!(operation.args.len(), 1);
    assert_eq!(operation.ret.as_ref().expect("return type").render(), "String");
    assert!(operation.body.is_empty());
}

#[test]
fn last_out_argument_wins() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="first" type="i" direction="out"/>
             <arg name="second" type="s" direction="out"/>
           </method>"#,
    );
    let (set, _) = compile_single(&xml);

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert_eq!(forward.ret.as_ref().expect("return type").render(), "String");

    let adapter_ctor = set.adapter.constructor.expect("adapter ctor");
    assert!(
        adapter_ctor.instructions.contains(&Instruction::SetArgName {
            ordinal: 0,
            name: "second".to_string(),
        }),
        "return-value name must follow the last out argument"
    );
}

#[test]
fn unnamed_later_out_argument_keeps_the_earlier_name() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="first" type="i" direction="out"/>
             <arg type="s" direction="out"/>
           </method>"#,
    );
    let (set, _) = compile_single(&xml);

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert_eq!(forward.ret.as_ref().expect("return type").render(), "String");

    let adapter_ctor = set.adapter.constructor.expect("adapter ctor");
    assert!(adapter_ctor.instructions.contains(&Instruction::SetArgName {
        ordinal: 0,
        name: "first".to_string(),
    }));
}

#[test]
fn unnamed_arg_is_auto_named_by_ordinal() {
    // The out argument occupies ordinal 1, so the unnamed in argument at
    // ordinal 2 becomes arg2 even though it is the second inbound one.
    let xml = doc(
        r#"<method name="Bar">
             <arg name="a" type="s" direction="in"/>
             <arg name="r" type="s" direction="out"/>
             <arg type="s" direction="in"/>
           </method>"#,
    );
    let (set, _) = compile_single(&xml);

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    let names: Vec<&str> = forward.args.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["a", "arg2"]);
}

#[test]
fn missing_direction_is_assumed_in() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="x" type="i"/>
           </method>"#,
    );
    let (set, output) = compile_single(&xml);

    assert_eq!(output.report.diagnostics.len(), 1);
    let diagnostic = &output.report.diagnostics[0];
    assert_eq!(diagnostic.code, "BBC-ARG-0001");
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert!(output.report.ok, "a warning must not fail the report");

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert_eq!(forward.args.len(), 1);
    assert!(forward.ret.is_none());
    assert_eq!(
        forward.body,
        vec![Instruction::ForwardCall {
            slot: "method_Bar".to_string(),
            args: vec!["x".to_string()],
            returns: false,
        }]
    );
}

#[test]
fn dots_in_method_names_become_underscores() {
    let xml = doc(r#"<method name="com.example.Frobnicate"/>"#);
    let (set, _) = compile_single(&xml);

    let forward = set
        .proxy
        .method("com_example_Frobnicate")
        .expect("renamed forwarding method");
    assert!(forward.args.is_empty());

    let proxy_ctor = set.proxy.constructor.expect("proxy ctor");
    assert_eq!(
        proxy_ctor.instructions,
        vec![Instruction::RegisterMethod {
            slot: "method_com_example_Frobnicate".to_string(),
            interface: "com.example.Foo".to_string(),
            method: "com_example_Frobnicate".to_string(),
        }]
    );
}

#[test]
fn malformed_signature_aborts_the_compilation() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="x" type="a{s" direction="in"/>
           </method>"#,
    );
    let err = compile_document(&xml, &CompileOptions::default()).expect_err("must abort");
    assert_eq!(err.kind, CompileErrorKind::Signature);
    assert_eq!(err.kind.stage(), Stage::Signature);
    assert!(err.line.is_some());
}

#[test]
fn multi_type_signature_warns_and_uses_the_first() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="x" type="is" direction="in"/>
           </method>"#,
    );
    let (set, output) = compile_single(&xml);

    assert_eq!(output.report.diagnostics.len(), 1);
    assert_eq!(output.report.diagnostics[0].code, "BBC-TYPE-0001");

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert_eq!(forward.args[0].ty.render(), "i32");
}

#[test]
fn arg_without_type_is_dropped() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="x" direction="in"/>
           </method>"#,
    );
    let (set, output) = compile_single(&xml);

    assert_eq!(output.report.diagnostics.len(), 1);
    assert_eq!(output.report.diagnostics[0].code, "BBC-ARG-0002");

    let forward = set.proxy.method("Bar").expect("proxy forwarding method");
    assert!(forward.args.is_empty());
}
