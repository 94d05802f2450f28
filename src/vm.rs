//! Dynamic VM loader and bootstrap (C8). Uses the `jni` crate's invocation
//! feature, which wraps the dlopen-plus-`JNI_CreateJavaVM` dance the
//! original source hand-rolled in C. Chosen over raw `libloading`/FFI
//! because it's the idiomatic way this corpus embeds a JVM (see
//! `other_examples/manifests/jmeggitt-rust_jvm/Cargo.toml` in DESIGN.md).

use crate::error::HashdotError;
use jni::{InitArgsBuilder, JNIVersion, JavaVM};
use log::debug;

/// Boot a JVM with the given option strings (already fully formatted, e.g.
/// `-Xmx512m`, `-Djava.class.path=...`). `ignoreUnrecognized` is left false
/// per spec ch.4.6 step 9: an option the VM doesn't understand is fatal.
pub fn create(options: &[String]) -> Result<JavaVM, HashdotError> {
    let mut builder = InitArgsBuilder::new()
        .version(JNIVersion::V8)
        .ignore_unrecognized(false);
    for option in options {
        debug!("VM option: {option}");
        builder = builder.option(option);
    }
    let args = builder
        .build()
        .map_err(|error| HashdotError::VmInit(error.to_string()))?;

    JavaVM::new(args).map_err(|error| HashdotError::VmLoad(error.to_string()))
}

/// Resolve and invoke `<class>.main(String[])`, translating the dotted
/// `hashdot.main` form to the JNI-internal slash-separated form.
pub fn invoke_main(
    vm: &JavaVM,
    main_class: &str,
    args: &[String],
) -> Result<(), HashdotError> {
    let internal_name = main_class.replace('.', "/");
    let mut env = vm
        .attach_current_thread()
        .map_err(|error| HashdotError::VmInit(error.to_string()))?;

    let class = env
        .find_class(&internal_name)
        .map_err(|_| HashdotError::EntryNotFound(main_class.to_string()))?;

    let string_class = env
        .find_class("java/lang/String")
        .map_err(|_| HashdotError::EntryNotFound("java.lang.String".to_string()))?;
    let empty_string = env
        .new_string("")
        .map_err(|error| HashdotError::VmInit(error.to_string()))?;
    let array = env
        .new_object_array(args.len() as i32, &string_class, empty_string)
        .map_err(|error| HashdotError::VmInit(error.to_string()))?;
    for (i, arg) in args.iter().enumerate() {
        let jarg = env
            .new_string(arg)
            .map_err(|error| HashdotError::VmInit(error.to_string()))?;
        env.set_object_array_element(&array, i as i32, jarg)
            .map_err(|error| HashdotError::VmInit(error.to_string()))?;
    }

    let result = env.call_static_method(
        &class,
        "main",
        "([Ljava/lang/String;)V",
        &[(&array).into()],
    );

    if env.exception_check().unwrap_or(false) {
        env.exception_describe().ok();
        env.exception_clear().ok();
    }

    result
        .map_err(|error| HashdotError::VmInit(error.to_string()))?;
    Ok(())
}
