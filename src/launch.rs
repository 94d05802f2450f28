//! Launch driver (C7): orchestrates composition, self re-exec for library
//! path, environment injection, process rename, daemonization, VM bootstrap
//! and the final transfer of control. Grounded on `execute.rs`'s process
//! construction ergonomics and `main.rs`'s top-level `anyhow::Result`
//! propagation shape; the fork/setsid/prctl primitives have no teacher
//! analogue and come from `libc` instead (see DESIGN.md).

use crate::{
    classpath, compose,
    compose::ComposeInputs,
    error::HashdotError,
    flags,
    options,
    profile::profile_dir,
    properties::{PropertyStore, CLASSPATH_KEY},
    vm,
};
use indexmap::IndexSet;
use log::{debug, info, trace};
use std::{
    env,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::Command,
};

/// Entry point for `main`: run the whole pipeline over the process's own
/// argv. Returns `anyhow::Result` so callers can downcast to
/// [HashdotError] for exit-code mapping, matching the teacher's
/// `ExitCodeError` downcast pattern in its own `main`.
pub fn run(argv: Vec<String>) -> anyhow::Result<()> {
    Ok(run_inner(argv)?)
}

fn run_inner(argv: Vec<String>) -> Result<(), HashdotError> {
    let invocation_name = invocation_name(&argv);
    let dir = profile_dir();

    let (script_path, remaining_args, invocation_profile) =
        resolve_script(&argv, &invocation_name, &dir)?;

    let env_profile = env::var("HASHDOT_PROFILE").ok();
    let mut store = compose::compose(&ComposeInputs {
        profile_dir: &dir,
        script_path: &script_path,
        env_profile: env_profile.as_deref(),
        invocation_profile: invocation_profile.as_deref(),
    })?;

    expand_classpath(&mut store)?;
    maybe_reexec_for_libpath(&store, &argv)?;
    inject_environment(&store);
    rename_process(&script_path, &invocation_name);

    if daemonize_requested(&store) {
        daemonize(&store)?;
    }

    let options = build_vm_options(&store)?;
    let vm = vm::create(&options)?;

    let main_class = store
        .get_scalar("hashdot.main")
        .ok_or_else(|| HashdotError::Config("hashdot.main is required".into()))?
        .to_string();

    let mut final_args: Vec<String> = store
        .get("hashdot.args.pre")
        .map(|values| values.to_vec())
        .unwrap_or_default();
    final_args.extend(remaining_args);

    info!("Transferring control to {main_class}");
    vm::invoke_main(&vm, &main_class, &final_args)
}

fn invocation_name(argv: &[String]) -> String {
    argv.first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hashdot".to_string())
}

/// Find the script path and the argv slice that belongs to the script, per
/// spec ch.4.6 step 2 and ch.4.7. Returns `(script_path, script_args,
/// invocation_profile)`.
fn resolve_script(
    argv: &[String],
    invocation_name: &str,
    dir: &Path,
) -> Result<(PathBuf, Vec<String>, Option<String>), HashdotError> {
    if invocation_name == "hashdot" {
        let script = argv.get(1).ok_or_else(|| {
            HashdotError::Config("usage: hashdot <script> [args...]".into())
        })?;
        return Ok((
            PathBuf::from(script),
            argv.get(2..).unwrap_or_default().to_vec(),
            None,
        ));
    }

    // Pre-load enough profile state (default + env profile + the
    // invocation-name profile itself) to learn its flag-skipping rules
    // before we know the script path.
    let mut pre_store = PropertyStore::new();
    let mut stack = IndexSet::new();
    crate::profile::load_profile(dir, "default", &mut pre_store, &mut stack)?;
    if let Ok(env_profile) = env::var("HASHDOT_PROFILE") {
        crate::profile::load_profile(dir, &env_profile, &mut pre_store, &mut stack)?;
    }
    crate::profile::load_profile(dir, invocation_name, &mut pre_store, &mut stack)?;

    let value_args = pre_store
        .get("hashdot.parse_flags.value_args")
        .map(|v| v.to_vec())
        .unwrap_or_default();
    let terminal = pre_store
        .get("hashdot.parse_flags.terminal")
        .map(|v| v.to_vec())
        .unwrap_or_default();

    let rest = argv.get(1..).unwrap_or_default();
    let scan = flags::scan(rest, &value_args, &terminal);

    match scan.script_index {
        Some(idx) => Ok((
            PathBuf::from(&rest[idx]),
            scan.remaining.to_vec(),
            Some(invocation_name.to_string()),
        )),
        None => {
            // Terminal flag hit (or no script argument at all): the script
            // path comes from the invocation profile itself.
            let script = pre_store.get_scalar("hashdot.script").ok_or_else(|| {
                HashdotError::Config(
                    "no script path on argv and profile defines no hashdot.script"
                        .into(),
                )
            })?;
            Ok((
                PathBuf::from(script),
                scan.remaining.to_vec(),
                Some(invocation_name.to_string()),
            ))
        }
    }
}

fn expand_classpath(store: &mut PropertyStore) -> Result<(), HashdotError> {
    if let Some(values) = store.get(CLASSPATH_KEY) {
        let expanded = classpath::expand(values)?;
        store.insert(CLASSPATH_KEY.to_string(), expanded);
    }
    Ok(())
}

/// Self re-exec so the dynamic loader picks up an updated
/// `LD_LIBRARY_PATH`. Resolves the running executable's own path via the OS
/// self-link rather than argv[0], which may have been resolved through
/// `PATH` and no longer point anywhere useful after re-exec.
fn maybe_reexec_for_libpath(
    store: &PropertyStore,
    argv: &[String],
) -> Result<(), HashdotError> {
    let Some(libpaths) = store.get("hashdot.vm.libpath") else {
        return Ok(());
    };

    let current = env::var("LD_LIBRARY_PATH").unwrap_or_default();
    let missing: Vec<&str> = libpaths
        .iter()
        .map(String::as_str)
        .filter(|p| !current.contains(*p))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let mut new_path = missing.join(":");
    if !current.is_empty() {
        new_path.push(':');
        new_path.push_str(&current);
    }
    debug!("Re-exec with LD_LIBRARY_PATH={new_path}");

    let exe = env::current_exe().map_err(|source| HashdotError::Io {
        path: "<current executable>".into(),
        source,
    })?;

    let error = Command::new(exe)
        .args(&argv[1..])
        .env("LD_LIBRARY_PATH", new_path)
        .exec();
    // exec() only returns on failure.
    Err(HashdotError::Io {
        path: "<self re-exec>".into(),
        source: error,
    })
}

fn inject_environment(store: &PropertyStore) {
    for (name, values) in store.iter_non_classpath() {
        if let Some(var_name) = name.strip_prefix("hashdot.env.") {
            let value = values.join(" ");
            trace!("Setting environment variable {var_name}={value}");
            env::set_var(var_name, value);
        }
    }
}

/// Rename the OS process to the script's basename (or the invocation name
/// if there's no script basename). Best-effort: a platform with no
/// equivalent syscall just logs and continues rather than failing launch,
/// per SPEC_FULL.md ch.10.6.
fn rename_process(script_path: &Path, invocation_name: &str) {
    let name = script_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| invocation_name.to_string());

    #[cfg(target_os = "linux")]
    {
        use std::ffi::CString;
        if let Ok(cname) = CString::new(name.as_bytes()) {
            // PR_SET_NAME truncates to 15 bytes; that's a kernel limit we
            // can't do anything about here.
            unsafe {
                libc::prctl(libc::PR_SET_NAME, cname.as_ptr() as libc::c_ulong, 0, 0, 0);
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        debug!("Process rename to {name} skipped: unsupported on this platform");
    }
}

fn daemonize_requested(store: &PropertyStore) -> bool {
    match store.get("hashdot.daemonize") {
        Some(values) => values.join(":") != "false",
        None => false,
    }
}

/// Fork, exit the parent, `setsid` the child, and optionally redirect
/// stdio. Mirrors the original source's fork/setsid/freopen sequence.
fn daemonize(store: &PropertyStore) -> Result<(), HashdotError> {
    // SAFETY: fork() is the one place we deliberately step outside Rust's
    // usual guarantees; nothing between fork and exec touches non-async-
    // signal-safe state.
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(HashdotError::Io {
            path: "<fork>".into(),
            source: std::io::Error::last_os_error(),
        });
    }
    if pid > 0 {
        std::process::exit(0);
    }

    if unsafe { libc::setsid() } < 0 {
        return Err(HashdotError::Io {
            path: "<setsid>".into(),
            source: std::io::Error::last_os_error(),
        });
    }

    if let Some(log_file) = store.get("hashdot.io_redirect.file") {
        let path = log_file.join("/");
        let append = store
            .get("hashdot.io_redirect.append")
            .map(|values| values.join(":"))
            .as_deref()
            != Some("false");
        redirect_io(&path, append)?;
    }

    Ok(())
}

fn redirect_io(log_path: &str, append: bool) -> Result<(), HashdotError> {
    use std::fs::OpenOptions;

    let devnull = std::ffi::CString::new("/dev/null").unwrap();
    unsafe {
        let fd = libc::open(devnull.as_ptr(), libc::O_RDONLY);
        if fd >= 0 {
            libc::dup2(fd, libc::STDIN_FILENO);
            libc::close(fd);
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(append)
        .truncate(!append)
        .write(true)
        .open(log_path)
        .map_err(|source| HashdotError::Io {
            path: log_path.to_string(),
            source,
        })?;

    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    unsafe {
        libc::dup2(fd, libc::STDOUT_FILENO);
        libc::dup2(fd, libc::STDERR_FILENO);
    }
    // Leak the handle; the dup'd fds keep the file open for the process
    // lifetime and we don't want it closed when `file` drops here.
    std::mem::forget(file);
    Ok(())
}

/// Build the full VM option list: compacted `hashdot.vm.options`, then the
/// synthesized classpath option, then one `-D<name>=<values>` per remaining
/// property, per spec ch.4.6 step 9.
fn build_vm_options(store: &PropertyStore) -> Result<Vec<String>, HashdotError> {
    let mut options = Vec::new();

    if let Some(vm_options) = store.get("hashdot.vm.options") {
        options.extend(options::compact(vm_options));
    }

    if let Some(classpath) = store.get(CLASSPATH_KEY) {
        options.push(format!("-D{CLASSPATH_KEY}={}", classpath.join(":")));
    }

    for (name, values) in store.iter_non_classpath() {
        if name == "hashdot.vm.options" {
            continue;
        }
        options.push(format!("-D{name}={}", values.join(" ")));
    }

    Ok(options)
}
