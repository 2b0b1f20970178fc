
use binres::{AxmlParser, AxmlWriter, Error, PatchValue, TypedValue, is_axml, render_document};
use fixtures::{ANDROID_NS, AttrValue, AxmlBuilder, ensure_env_logger_initialized};
use pretty_assertions::assert_eq;

fn manifest_document() -> Vec<u8> {
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.start_element(
        None,
        "manifest",
        &[
            (Some(ANDROID_NS), "versionCode", AttrValue::IntDec(7)),
            (Some(ANDROID_NS), "versionName", AttrValue::Str("1.0.7")),
            (None, "package", AttrValue::Str("com.example.app")),
        ],
    );
    b.start_element(
        None,
        "uses-permission",
        &[(Some(ANDROID_NS), "name", AttrValue::Str("android.permission.INTERNET"))],
    );
    b.end_element(None, "uses-permission");
    b.start_element(
        None,
        "uses-permission",
        &[(Some(ANDROID_NS), "name", AttrValue::Str("android.permission.CAMERA"))],
    );
    b.end_element(None, "uses-permission");
    b.start_element(
        None,
        "application",
        &[(Some(ANDROID_NS), "debuggable", AttrValue::Bool(0xFFFF_FFFF))],
    );
    b.start_element(
        None,
        "meta-data",
        &[
            (Some(ANDROID_NS), "name", AttrValue::Str("api_key")),
            (Some(ANDROID_NS), "value", AttrValue::Str("original-key")),
        ],
    );
    b.end_element(None, "meta-data");
    b.end_element(None, "application");
    b.end_element(None, "manifest");
    b.end_namespace("android", ANDROID_NS);
    b.build()
}

#[test]
fn detects_the_file_signature() {
    ensure_env_logger_initialized();
    assert!(is_axml(&manifest_document()));
    assert!(!is_axml(&fixtures::sample_resources()));
    assert!(!is_axml(&[0x03, 0x00]));
}

#[test]
fn decodes_a_manifest() {
    ensure_env_logger_initialized();
    let data = manifest_document();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();

    let root = doc.root().unwrap();
    assert_eq!(root.name, "manifest");
    assert_eq!(
        root.attributes[0],
        ("xmlns:android".to_string(), TypedValue::String(ANDROID_NS.to_string()))
    );
    assert_eq!(root.attribute("android:versionCode"), Some(&TypedValue::IntDec(7)));
    assert_eq!(
        root.attribute("android:versionName"),
        Some(&TypedValue::String("1.0.7".to_string()))
    );

    let permissions: Vec<&str> = root
        .elements()
        .filter(|el| el.name == "uses-permission")
        .filter_map(|el| match el.attribute("android:name") {
            Some(TypedValue::String(s)) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(permissions, vec!["android.permission.INTERNET", "android.permission.CAMERA"]);

    let application = root.elements().find(|el| el.name == "application").unwrap();
    assert_eq!(application.attribute("android:debuggable"), Some(&TypedValue::Boolean(true)));
}

#[test]
fn renders_a_manifest() {
    ensure_env_logger_initialized();
    let data = manifest_document();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
    let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <manifest xmlns:android=\"http://schemas.android.com/apk/res/android\" \
        android:versionCode=\"7\" android:versionName=\"1.0.7\" package=\"com.example.app\">\n  \
        <uses-permission android:name=\"android.permission.INTERNET\"/>\n  \
        <uses-permission android:name=\"android.permission.CAMERA\"/>\n  \
        <application android:debuggable=\"true\">\n    \
        <meta-data android:name=\"api_key\" android:value=\"original-key\"/>\n  \
        </application>\n\
        </manifest>\n";
    assert_eq!(render_document(&doc), expected);
}

#[test]
fn parsing_is_deterministic() {
    ensure_env_logger_initialized();
    let data = manifest_document();
    let parser = AxmlParser::new(&data).unwrap();
    assert_eq!(parser.parse().unwrap(), parser.parse().unwrap());
}

#[test]
fn boolean_attribute_words() {
    ensure_env_logger_initialized();
    let cases = [(0u32, false), (1, true), (0xFFFF_FFFF, true), (2, false)];
    for (raw, expected) in cases {
        let mut b = AxmlBuilder::new();
        b.start_namespace("android", ANDROID_NS);
        b.start_element(None, "flag", &[(Some(ANDROID_NS), "enabled", AttrValue::Bool(raw))]);
        b.end_element(None, "flag");
        b.end_namespace("android", ANDROID_NS);

        let data = b.build();
        let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
        assert_eq!(
            doc.root().unwrap().attribute("android:enabled"),
            Some(&TypedValue::Boolean(expected)),
            "raw word {raw:#x}"
        );
    }
}

#[test]
fn decodes_text_content() {
    ensure_env_logger_initialized();
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.start_element(None, "string", &[]);
    b.text("hello world");
    b.end_element(None, "string");
    b.end_namespace("android", ANDROID_NS);

    let data = b.build();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
    assert_eq!(doc.root().unwrap().text(), Some("hello world"));
    assert_eq!(
        render_document(&doc),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<string>hello world</string>\n"
    );
}

#[test]
fn only_the_most_recent_namespace_is_synthesized() {
    ensure_env_logger_initialized();
    const RES_AUTO: &str = "http://schemas.android.com/apk/res-auto";
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.start_namespace("app", RES_AUTO);
    b.start_element(
        None,
        "view",
        &[
            (Some(ANDROID_NS), "id", AttrValue::IntHex(0x7f08_0001)),
            (Some(RES_AUTO), "layout_constraintTop", AttrValue::Str("parent")),
        ],
    );
    b.end_element(None, "view");
    b.end_namespace("app", RES_AUTO);
    b.end_namespace("android", ANDROID_NS);

    let data = b.build();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
    let root = doc.root().unwrap();
    let keys: Vec<&str> = root.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["xmlns:app", "android:id", "app:layout_constraintTop"]);
}

#[test]
fn inner_namespace_declarations_win() {
    ensure_env_logger_initialized();
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.start_element(None, "outer", &[(Some(ANDROID_NS), "name", AttrValue::Str("a"))]);
    b.start_namespace("inner", ANDROID_NS);
    b.start_element(None, "child", &[(Some(ANDROID_NS), "name", AttrValue::Str("b"))]);
    b.end_element(None, "child");
    b.end_namespace("inner", ANDROID_NS);
    b.end_element(None, "outer");
    b.end_namespace("android", ANDROID_NS);

    let data = b.build();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
    let outer = doc.root().unwrap();
    assert!(outer.attribute("android:name").is_some());
    let child = outer.elements().next().unwrap();
    let keys: Vec<&str> = child.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["xmlns:inner", "inner:name"]);
}

#[test]
fn skips_chunks_between_pool_and_body() {
    ensure_env_logger_initialized();
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.start_element(None, "manifest", &[(None, "package", AttrValue::Str("com.example.app"))]);
    b.end_element(None, "manifest");
    b.end_namespace("android", ANDROID_NS);

    let data = b.build_with_resource_map();
    let doc = AxmlParser::new(&data).unwrap().parse().unwrap();
    assert_eq!(doc.root().unwrap().name, "manifest");
}

#[test]
fn cdata_and_entity_events_are_rejected() {
    ensure_env_logger_initialized();
    for (tag, expected) in [(0x0010_0105u32, "CDATA sections"), (0x0010_0106, "entity references")] {
        let mut b = AxmlBuilder::new();
        b.start_namespace("android", ANDROID_NS);
        b.start_element(None, "root", &[]);
        b.raw_event(tag);

        let data = b.build();
        match AxmlParser::new(&data).unwrap().parse() {
            Err(Error::UnsupportedConstruct { construct }) => assert_eq!(construct, expected),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[test]
fn unknown_event_tags_are_rejected() {
    ensure_env_logger_initialized();
    let mut b = AxmlBuilder::new();
    b.start_namespace("android", ANDROID_NS);
    b.raw_event(0x0010_0199);

    let data = b.build();
    assert!(matches!(
        AxmlParser::new(&data).unwrap().parse(),
        Err(Error::MalformedChunk { tag: 0x0010_0199, .. })
    ));
}

#[test]
fn rejects_non_axml_input() {
    ensure_env_logger_initialized();
    assert!(matches!(
        AxmlParser::new(&fixtures::sample_resources()),
        Err(Error::MalformedChunk { offset: 0, .. })
    ));
}

#[test]
fn patches_an_integer_attribute() {
    ensure_env_logger_initialized();
    let mut writer = AxmlWriter::new(manifest_document()).unwrap();
    writer
        .modify_named_value("manifest", "android:versionCode", PatchValue::Integer(42))
        .unwrap();

    let patched = writer.into_inner();
    let doc = AxmlParser::new(&patched).unwrap().parse().unwrap();
    assert_eq!(doc.root().unwrap().attribute("android:versionCode"), Some(&TypedValue::IntDec(42)));
}

#[test]
fn patches_a_string_attribute() {
    ensure_env_logger_initialized();
    let original = manifest_document();
    let before = AxmlParser::new(&original).unwrap().strings().to_vec();

    let mut writer = AxmlWriter::new(original.clone()).unwrap();
    writer
        .modify_named_value("meta-data", "android:value", PatchValue::String("patched-key"))
        .unwrap();

    let patched = writer.into_inner();
    assert_eq!((patched.len() - original.len()) % 4, 0);
    assert_eq!(
        u32::from_le_bytes(patched[4..8].try_into().unwrap()) as usize,
        patched.len()
    );

    let parser = AxmlParser::new(&patched).unwrap();
    assert_eq!(parser.strings().len(), before.len() + 1);
    assert_eq!(&parser.strings()[..before.len()], &before[..]);
    assert_eq!(parser.strings().last().map(String::as_str), Some("patched-key"));

    let doc = parser.parse().unwrap();
    let root = doc.root().unwrap();
    let meta = root
        .elements()
        .find(|el| el.name == "application")
        .and_then(|app| app.elements().next())
        .unwrap();
    assert_eq!(
        meta.attribute("android:value"),
        Some(&TypedValue::String("patched-key".to_string()))
    );
    // Untouched values survive the splice.
    assert_eq!(meta.attribute("android:name"), Some(&TypedValue::String("api_key".to_string())));
    assert_eq!(
        root.attribute("android:versionName"),
        Some(&TypedValue::String("1.0.7".to_string()))
    );
}

#[test]
fn sequential_patches_accumulate() {
    ensure_env_logger_initialized();
    let mut writer = AxmlWriter::new(manifest_document()).unwrap();
    writer
        .modify_named_value("manifest", "android:versionName", PatchValue::String("2.0.0"))
        .unwrap();
    writer
        .modify_named_value("manifest", "android:versionCode", PatchValue::Integer(200))
        .unwrap();
    writer
        .modify_named_value("meta-data", "android:value", PatchValue::String("rotated-key"))
        .unwrap();

    let patched = writer.into_inner();
    assert_eq!(
        u32::from_le_bytes(patched[4..8].try_into().unwrap()) as usize,
        patched.len()
    );
    let doc = AxmlParser::new(&patched).unwrap().parse().unwrap();
    let root = doc.root().unwrap();
    assert_eq!(
        root.attribute("android:versionName"),
        Some(&TypedValue::String("2.0.0".to_string()))
    );
    assert_eq!(root.attribute("android:versionCode"), Some(&TypedValue::IntDec(200)));
}

#[test]
fn patch_type_mismatches_are_rejected() {
    ensure_env_logger_initialized();
    let mut writer = AxmlWriter::new(manifest_document()).unwrap();
    assert!(matches!(
        writer.modify_named_value("manifest", "android:versionName", PatchValue::Integer(1)),
        Err(Error::UnsupportedConstruct { .. })
    ));
    assert!(matches!(
        writer.modify_named_value("manifest", "android:versionCode", PatchValue::String("x")),
        Err(Error::UnsupportedConstruct { .. })
    ));
}

#[test]
fn missing_attributes_are_reported() {
    ensure_env_logger_initialized();
    let mut writer = AxmlWriter::new(manifest_document()).unwrap();
    match writer.modify_named_value("manifest", "android:missing", PatchValue::Integer(1)) {
        Err(Error::AttributeNotFound { element, attribute }) => {
            assert_eq!(element, "manifest");
            assert_eq!(attribute, "android:missing");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
