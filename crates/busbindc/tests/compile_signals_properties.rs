use busbindc::diagnostics::Severity;
use busbindc::model::{Instruction, MethodKind, SlotKind};

mod introspection_doc;
use introspection_doc::{compile_single, doc};

#[test]
fn signal_is_wired_on_both_sides() {
    let xml = doc(
        r#"<signal name="Baz">
             <arg name="msg" type="s"/>
           </signal>"#,
    );
    let (set, output) = compile_single(&xml);
    // Signal args carry no direction attribute; that must not warn.
    assert!(output.report.diagnostics.is_empty());

    let emit_slot = set.adapter.member("signal_Baz").expect("emit channel");
    assert_eq!(emit_slot.kind, SlotKind::SignalEmitter);
    assert_eq!(emit_slot.args.len(), 1);
    assert_eq!(emit_slot.args[0].render(), "String");

    let emit = set.adapter.method("Baz").expect("emit method");
    assert_eq!(emit.kind, MethodKind::Instance);
    assert_eq!(emit.args.len(), 1);
    assert_eq!(
        emit.body,
        vec![Instruction::EmitSignal {
            slot: "signal_Baz".to_string(),
            args: vec!["msg".to_string()],
        }]
    );

    let adapter_accessor = set.adapter.method("signal_Baz").expect("adapter accessor");
    assert_eq!(
        adapter_accessor.body,
        vec![Instruction::ReturnSlot {
            slot: "signal_Baz".to_string(),
        }]
    );

    let adapter_ctor = set.adapter.constructor.expect("adapter ctor");
    assert_eq!(
        adapter_ctor.instructions,
        vec![Instruction::RegisterSignal {
            slot: "signal_Baz".to_string(),
            interface: "com.example.Foo".to_string(),
            signal: "Baz".to_string(),
        }]
    );

    let subscribe_slot = set.proxy.member("signal_proxy_Baz").expect("subscribe channel");
    assert_eq!(subscribe_slot.kind, SlotKind::SignalSubscription);

    let proxy_accessor = set.proxy.method("signal_Baz").expect("proxy accessor");
    assert_eq!(
        proxy_accessor.body,
        vec![Instruction::ReturnSlot {
            slot: "signal_proxy_Baz".to_string(),
        }]
    );

    let proxy_ctor = set.proxy.constructor.expect("proxy ctor");
    assert_eq!(
        proxy_ctor.instructions,
        vec![Instruction::SubscribeSignal {
            slot: "signal_proxy_Baz".to_string(),
            interface: "com.example.Foo".to_string(),
            signal: "Baz".to_string(),
            dispatch: "signal_dispatch".to_string(),
        }]
    );
}

#[test]
fn signal_without_name_contributes_nothing() {
    let xml = doc(
        r#"<signal>
             <arg name="msg" type="s"/>
           </signal>"#,
    );
    let (set, output) = compile_single(&xml);

    assert_eq!(output.report.diagnostics.len(), 1);
    assert_eq!(output.report.diagnostics[0].code, "BBC-SIGNAL-0001");
    assert_eq!(output.report.diagnostics[0].severity, Severity::Error);

    assert!(set.adapter.members.is_empty());
    assert_eq!(set.adapter.methods.len(), 2, "factories only");
    assert!(set.proxy.members.is_empty());
}

#[test]
fn readwrite_property_gets_accessor_and_mutator() {
    let xml = doc(r#"<property name="Count" type="i" access="readwrite"/>"#);
    let (set, output) = compile_single(&xml);
    assert!(output.report.ok);

    let getter = set.proxy.method("Count").expect("getter");
    assert!(getter.args.is_empty());
    assert_eq!(getter.ret.as_ref().expect("type").render(), "i32");
    assert_eq!(
        getter.body,
        vec![Instruction::GetProperty {
            name: "Count".to_string(),
        }]
    );

    let setter = set.proxy.method("set_Count").expect("setter");
    assert_eq!(setter.args.len(), 1);
    assert_eq!(setter.args[0].name, "Count");
    assert!(setter.ret.is_none());
    assert_eq!(
        setter.body,
        vec![Instruction::SetProperty {
            name: "Count".to_string(),
            arg: "Count".to_string(),
        }]
    );
}

#[test]
fn read_only_property_has_no_mutator() {
    let xml = doc(r#"<property name="Count" type="i" access="read"/>"#);
    let (set, _) = compile_single(&xml);
    assert!(set.proxy.method("Count").is_some());
    assert!(set.proxy.method("set_Count").is_none());
}

#[test]
fn write_only_property_has_no_accessor() {
    let xml = doc(r#"<property name="Count" type="i" access="write"/>"#);
    let (set, _) = compile_single(&xml);
    assert!(set.proxy.method("Count").is_none());
    assert!(set.proxy.method("set_Count").is_some());
}

#[test]
fn property_missing_attributes_is_dropped_with_one_diagnostic_each() {
    let xml = doc(r#"<property name="Count"/>"#);
    let (set, output) = compile_single(&xml);

    let codes: Vec<&str> = output
        .report
        .diagnostics
        .iter()
        .map(|d| d.code.as_str())
        .collect();
    assert_eq!(codes, vec!["BBC-PROP-0002", "BBC-PROP-0003"]);
    assert!(set.proxy.method("Count").is_none());
}

#[test]
fn unknown_property_access_generates_nothing() {
    let xml = doc(r#"<property name="Count" type="i" access="frobnicate"/>"#);
    let (set, output) = compile_single(&xml);

    assert_eq!(output.report.diagnostics.len(), 1);
    assert_eq!(output.report.diagnostics[0].code, "BBC-PROP-0004");
    assert_eq!(output.report.diagnostics[0].severity, Severity::Warning);
    assert!(set.proxy.method("Count").is_none());
    assert!(set.proxy.method("set_Count").is_none());
}

#[test]
fn callee_side_picks_up_type_imports() {
    let xml = doc(
        r#"<method name="Bar">
             <arg name="x" type="a{sv}" direction="in"/>
           </method>"#,
    );
    let (set, _) = compile_single(&xml);

    for class in [&set.adapter, &set.adaptee] {
        assert!(
            class.requires.contains("std::collections::HashMap"),
            "{} must require HashMap",
            class.name
        );
        assert!(
            class.requires.contains("busbind::Variant"),
            "{} must require Variant",
            class.name
        );
    }
    // The proxy keeps only its node-level baseline.
    assert!(!set.proxy.requires.contains("std::collections::HashMap"));
}
