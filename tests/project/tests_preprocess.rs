//! Foreign-interop preprocessing during discovery.

use std::sync::Arc;

use pkgscope::LoadError;

use crate::helpers::preprocessor::FakePreprocessor;
use crate::helpers::workspace::*;

const NATIVE_SRC: &str = "package native\n\nimport \"C\"\n\nfunc Answer() int {\n\treturn int(C.answer())\n}\n";

const REWRITTEN_SRC: &str = "package native\n\nfunc Answer() int {\n\treturn _Cfunc_answer()\n}\n";

const GENERATED_SRC: &str = "package native\n\nfunc _Cfunc_answer() int {\n\treturn 42\n}\n";

fn native(preprocessor: Arc<FakePreprocessor>) -> Workspace {
    Workspace::new()
        .file("native/native.go", NATIVE_SRC)
        .file("native/plain.go", "package native\n\nconst Plain = 1\n")
        .with_build(linux().with_foreign_interop(true))
        .with_preprocessor(preprocessor)
}

#[test]
fn test_outputs_replace_inputs_and_extend_the_package() {
    let fake = Arc::new(
        FakePreprocessor::new()
            .output("C", GENERATED_SRC)
            .output("native.go", REWRITTEN_SRC),
    );
    let ws = native(fake.clone());
    let pkgs = ws.loader().load(&["native"]).unwrap();

    let calls = fake.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].identity, "native");
    assert_eq!(calls[0].files, vec!["native.go"]);
    assert_eq!(calls[0].dir, ws.root().join("native"));

    let pkg = &pkgs[0];
    assert_eq!(pkg.files().len(), 3);
    assert!(pkg.lookup_object("native.Answer").is_ok());
    assert!(pkg.lookup_object("native._Cfunc_answer").is_ok());
    assert!(pkg.file(&ws.root().join("native/C").to_string_lossy()).is_some());
}

#[test]
fn test_block_comment_preamble_reaches_the_preprocessor() {
    let fake = Arc::new(
        FakePreprocessor::new()
            .output("C", GENERATED_SRC)
            .output("native.go", REWRITTEN_SRC),
    );
    let ws = Workspace::new()
        .file(
            "native/native.go",
            "package native\n\n/*\n#include <stdlib.h>\nint answer(void) { return 42; }\n*/\nimport \"C\"\n\nfunc Answer() int {\n\treturn int(C.answer())\n}\n",
        )
        .with_build(linux().with_foreign_interop(true))
        .with_preprocessor(fake.clone());
    let pkgs = ws.loader().load(&["native"]).unwrap();

    assert_eq!(fake.calls.lock()[0].files, vec!["native.go"]);
    assert!(pkgs[0].lookup_object("native.Answer").is_ok());
}

#[test]
fn test_without_interop_the_foreign_file_is_excluded() {
    let fake = Arc::new(FakePreprocessor::new());
    let ws = native(fake.clone()).with_build(linux());
    let pkgs = ws.loader().load(&["native"]).unwrap();

    assert!(fake.calls.lock().is_empty());
    assert_eq!(pkgs[0].files().len(), 2);
}

#[test]
fn test_foreign_import_without_preprocessor() {
    let ws = Workspace::new()
        .file("native/native.go", NATIVE_SRC)
        .with_build(linux().with_foreign_interop(true));
    let err = ws.loader().load(&["native"]).unwrap_err();
    assert!(matches!(err, LoadError::MissingPreprocessor(ref id) if id == "native"), "{err}");
}

#[test]
fn test_preprocessor_failure_aborts_the_load() {
    let fake = Arc::new(FakePreprocessor::failing("native.go:5: bad cast"));
    let err = native(fake).loader().load(&["native"]).unwrap_err();

    let LoadError::Preprocessor { identity, source } = err else {
        panic!("expected a preprocessor error, got {err}");
    };
    assert_eq!(identity, "native");
    assert!(source.to_string().contains("bad cast"));
}
