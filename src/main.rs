use anyhow::{bail, Context};
use blockvim::logging::{self, Logger};
use blockvim::{parse_keys, Config, MemoryHost, Session};
use std::path::PathBuf;

/// テキストファイルを1行1リージョンとして読み込み、キー列を再生して結果を表示する
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (path, script, config_path) = parse_args(&args)?;

    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::load_or_default()?,
    };
    if let Err(err) = logging::init(Logger::from_level_name(&config.log_level)) {
        eprintln!("Warning: failed to initialize logger: {}", err);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    let keys = parse_keys(&script)?;

    let mut session = Session::attach(MemoryHost::from_lines(&lines), config);
    if !session.is_ready() {
        bail!("{} has no lines to edit", path.display());
    }

    for key in &keys {
        session.handle_key(key);
        if session.deletion_pending() {
            // メモリ上のホストは削除を即座に反映させる
            session.host_mut().settle();
            session.on_mutation();
        }
        session.on_scroll();
    }

    for line in session.lines() {
        println!("{}", line);
    }
    println!("--");
    println!("mode: {}", session.mode().label());
    if let Some(clipboard) = session.host().clipboard() {
        println!("clipboard: {:?}", clipboard);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<(PathBuf, String, Option<PathBuf>)> {
    let mut positional = Vec::new();
    let mut config_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = iter.next() else {
                    bail!("--config requires a path");
                };
                config_path = Some(PathBuf::from(path));
            }
            _ => positional.push(arg.clone()),
        }
    }

    match positional.as_slice() {
        [path, script] => Ok((PathBuf::from(path), script.clone(), config_path)),
        _ => bail!("usage: blockvim [--config <file>] <lines-file> <keys>"),
    }
}
