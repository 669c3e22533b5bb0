//! Forks, wires, and waits for the child processes that make up a pipeline.
//!
//! A pipeline of N commands needs N-1 anonymous pipes, one process group
//! (the first command's pid), and exactly one exit status out the other
//! end — the last command's.

use os_pipe::{PipeReader, pipe};
use std::fs::{File, OpenOptions};
use std::io;
use std::process::{Child, Command as Process, Stdio};

use crate::pipeline::{Command, Pipeline};
use crate::signal;
use crate::status;

/// Run a pipeline to completion (or, for a background pipeline, launch it
/// and return immediately). Returns the value that becomes the shell's
/// "last status".
pub fn execute(pipeline: &Pipeline) -> i32 {
    if pipeline.is_empty() {
        return 0;
    }

    let background = pipeline
        .commands
        .last()
        .map(|c| c.background)
        .unwrap_or(false);

    let n = pipeline.commands.len();
    let mut children: Vec<Child> = Vec::with_capacity(n);
    let mut pipeline_pgid: Option<i32> = None;
    let mut prev_pipe: Option<PipeReader> = None;

    for (idx, cmd) in pipeline.commands.iter().enumerate() {
        let is_last = idx + 1 == n;

        let stdin_stdio = match build_stdin(cmd, prev_pipe.take()) {
            Ok(stdio) => stdio,
            Err(e) => {
                eprintln!("jsh: {e}");
                wait_all(&mut children);
                return 1;
            }
        };

        let (stdout_stdio, next_reader) = match build_stdout(cmd, is_last) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("jsh: {e}");
                wait_all(&mut children);
                return 1;
            }
        };

        let mut process = Process::new(&cmd.argv[0]);
        process.args(&cmd.argv[1..]);
        process.stdin(stdin_stdio).stdout(stdout_stdio).stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Snapshotted before the closure moves it: None on the first
            // stage (creates a new group), Some(leader) on later stages
            // (joins it).
            let captured_pgid = pipeline_pgid;
            unsafe {
                process.pre_exec(move || {
                    for &sig in &[libc::SIGINT, libc::SIGTSTP, libc::SIGQUIT, libc::SIGPIPE] {
                        if libc::signal(sig, libc::SIG_DFL) == libc::SIG_ERR {
                            return Err(io::Error::last_os_error());
                        }
                    }
                    let target_pgid = captured_pgid.unwrap_or(0) as libc::pid_t;
                    if libc::setpgid(0, target_pgid) != 0 {
                        return Err(io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        let child = match process.spawn() {
            Ok(child) => child,
            Err(e) => {
                let code = command_error(&cmd.argv[0], &e);
                wait_all(&mut children);
                return code;
            }
        };

        #[cfg(unix)]
        if pipeline_pgid.is_none() {
            let pid = child.id() as libc::pid_t;
            // Both the child's pre_exec and this call race to setpgid.
            // Whichever wins, the result is correct; the loser gets
            // EACCES/ESRCH, both safe to ignore.
            unsafe {
                libc::setpgid(pid, pid);
            }
            pipeline_pgid = Some(pid as i32);
        }

        children.push(child);
        prev_pipe = next_reader;
    }

    let pgid = pipeline_pgid.unwrap_or(0);

    if background {
        if let Some(last) = children.pop() {
            println!("[{}]", last.id());
        }
        // The rest of the pipeline is left to run; we do not reap it.
        drop(children);
        return 0;
    }

    #[cfg(unix)]
    {
        signal::set_foreground_pgid(pgid);
        let pids: Vec<libc::pid_t> = children.iter().map(|c| c.id() as libc::pid_t).collect();
        let last_pid = pids.last().copied();
        let result = wait_for_group(pgid as libc::pid_t, &pids, last_pid);
        signal::clear_foreground_pgid();
        match result {
            Ok(code) => code,
            Err(e) => {
                eprintln!("jsh: waitpid failed: {e}");
                1
            }
        }
    }

    #[cfg(not(unix))]
    {
        let mut last_code = 0;
        for child in &mut children {
            match child.wait() {
                Ok(st) => last_code = status::exit_code(st),
                Err(_) => return 1,
            }
        }
        last_code
    }
}

fn build_stdin(cmd: &Command, prev_pipe: Option<PipeReader>) -> io::Result<Stdio> {
    if let Some(path) = &cmd.input_file {
        let file = File::open(path)?;
        return Ok(Stdio::from(file));
    }
    Ok(match prev_pipe {
        Some(reader) => Stdio::from(reader),
        None => Stdio::inherit(),
    })
}

fn build_stdout(cmd: &Command, is_last: bool) -> io::Result<(Stdio, Option<PipeReader>)> {
    // Pipe i must exist whenever this isn't the last stage, independent of
    // whether output_file also overrides this stage's own write end: the
    // next stage still needs *something* to read from instead of falling
    // back to the shell's own terminal stdin.
    let next_pipe = if is_last { None } else { Some(pipe()?) };

    if let Some(path) = &cmd.output_file {
        let file = open_output_file(path, cmd.append_output)?;
        let reader = next_pipe.map(|(reader, _writer)| reader);
        return Ok((Stdio::from(file), reader));
    }

    match next_pipe {
        Some((reader, writer)) => Ok((Stdio::from(writer), Some(reader))),
        None => Ok((Stdio::inherit(), None)),
    }
}

/// Open (creating if needed) a redirection target with mode 0644, matching
/// the permission bits new files are created with regardless of the
/// process umask's own default.
fn open_output_file(path: &str, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    options.open(path)
}

fn wait_all(children: &mut Vec<Child>) {
    for mut child in children.drain(..) {
        let _ = child.wait();
    }
}

/// Map a spawn failure to the shell's exec-failure exit code. Every spawn
/// failure — not found, permission denied, or anything else the OS refuses
/// the exec for — is a 127, matching file/open failures (which are handled
/// separately and exit 1) against program-not-found/exec failures.
fn command_error(program: &str, e: &io::Error) -> i32 {
    if e.kind() == io::ErrorKind::NotFound {
        eprintln!("jsh: command not found: {program}");
    } else {
        eprintln!("jsh: {program}: {e}");
    }
    127
}

/// Wait for every pid in `pids` to leave the process group, reaping each
/// exactly once. Returns the exit status of `last_pid` only; earlier
/// statuses are discarded per the pipeline contract.
#[cfg(unix)]
fn wait_for_group(
    pgid: libc::pid_t,
    pids: &[libc::pid_t],
    last_pid: Option<libc::pid_t>,
) -> io::Result<i32> {
    use std::collections::HashSet;

    if pids.is_empty() {
        return Ok(0);
    }

    let mut remaining: HashSet<libc::pid_t> = pids.iter().copied().collect();
    let mut last_code = 0;

    while !remaining.is_empty() {
        let mut raw_status: libc::c_int = 0;
        let waited = unsafe { libc::waitpid(-pgid, &mut raw_status, 0) };

        if waited < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }

        if !remaining.remove(&waited) {
            continue;
        }

        if let Some(code) = status::exit_code_from_wait_status(raw_status) {
            if Some(waited) == last_pid {
                last_code = code;
            }
        }
    }

    Ok(last_code)
}
