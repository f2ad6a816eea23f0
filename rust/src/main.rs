use std::env;
use std::io::{self, Write};
use std::process;
use std::time::Instant;

use micro_uid::{
    ParsedUid, UidConfig, UidGen, format_with_separator, generate, is_symbol, parse_uid,
    strip_separators, validate,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct EmitOpts {
    config: UidConfig,
    count: usize,
}

fn print_help() {
    eprintln!(
        "micro-uid - short timestamped UID generator CLI\n\n\
Usage:\n  micro-uid next [--length <n>] [--no-separator]\n  micro-uid stream [--length <n>] [--no-separator] [--count <n>]\n  micro-uid validate <uid>\n  micro-uid parse <uid> [--json]\n  micro-uid format <raw>\n  micro-uid healthcheck [--length <n>] [--no-separator] [--json]\n  micro-uid bench [--length <n>] [--no-separator] [--count <n>]\n  micro-uid selftest\n\n\
Environment:\n  MICRO_UID_LENGTH     default symbol count (>= 8, default 10)\n  MICRO_UID_SEPARATOR  group symbols with '-' (default true)\n  RUST_LOG             log filter (default warn)\n\n\
For stream: --count 0 means infinite stream\n"
    );
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_emit_flags<F>(args: &[String], allow_count: bool, lookup: F) -> Result<EmitOpts, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut length = None;
    let mut with_separator = None;
    let mut count = 0;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--length" | "-n" => {
                if i + 1 >= args.len() {
                    return Err("missing value for --length".to_string());
                }
                length = Some(
                    args[i + 1]
                        .parse::<usize>()
                        .map_err(|_| "invalid integer for --length".to_string())?,
                );
                i += 2;
            }
            "--no-separator" => {
                with_separator = Some(false);
                i += 1;
            }
            "--separator" => {
                with_separator = Some(true);
                i += 1;
            }
            "--count" if allow_count => {
                if i + 1 >= args.len() {
                    return Err("missing value for --count".to_string());
                }
                count = args[i + 1]
                    .parse::<usize>()
                    .map_err(|_| "invalid integer for --count".to_string())?;
                i += 2;
            }
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
    }

    let config =
        UidConfig::resolve(lookup, length, with_separator).map_err(|e| e.to_string())?;
    Ok(EmitOpts { config, count })
}

fn run_next(args: &[String]) -> Result<(), String> {
    let opts = parse_emit_flags(args, false, env_lookup)?;
    let generator = UidGen::new(opts.config).map_err(|e| e.to_string())?;
    println!("{}", generator.next_uid().map_err(|e| e.to_string())?);
    Ok(())
}

fn run_stream(args: &[String]) -> Result<(), String> {
    let opts = parse_emit_flags(args, true, env_lookup)?;
    let generator = UidGen::new(opts.config).map_err(|e| e.to_string())?;
    let mut emitted = 0usize;

    loop {
        if opts.count > 0 && emitted >= opts.count {
            break;
        }
        println!("{}", generator.next_uid().map_err(|e| e.to_string())?);
        io::stdout().flush().map_err(|e| e.to_string())?;
        emitted += 1;
    }

    Ok(())
}

fn run_validate(args: &[String]) -> Result<(), String> {
    let [uid] = args else {
        return Err("validate requires exactly one uid".to_string());
    };

    let ok = validate(uid).is_some();
    println!("{}", if ok { "true" } else { "false" });
    if ok {
        Ok(())
    } else {
        Err("invalid uid".to_string())
    }
}

fn run_parse(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("parse requires a uid".to_string());
    }

    let uid = &args[0];
    let mut json_out = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--json" => json_out = true,
            _ => return Err(format!("unknown flag: {}", arg)),
        }
    }

    let parsed = parse_uid(uid).ok_or_else(|| "invalid uid".to_string())?;
    println!("{}", render_parsed(&parsed, json_out)?);
    Ok(())
}

fn render_parsed(parsed: &ParsedUid, json_out: bool) -> Result<String, String> {
    if json_out {
        let payload = json!({
            "raw": parsed.raw,
            "compact": parsed.compact,
            "elapsed": parsed.elapsed,
            "timestamp": parsed.timestamp.to_rfc3339(),
            "unix": parsed.timestamp_sec(),
        });
        serde_json::to_string(&payload).map_err(|e| e.to_string())
    } else {
        Ok(format!(
            "raw={}\ncompact={}\nelapsed={}\ntimestamp={}",
            parsed.raw,
            parsed.compact,
            parsed.elapsed,
            parsed.timestamp.to_rfc3339()
        ))
    }
}

fn run_format(args: &[String]) -> Result<(), String> {
    let [raw] = args else {
        return Err("format requires exactly one raw uid".to_string());
    };

    let raw = strip_separators(raw);
    if let Some(c) = raw.chars().find(|c| !is_symbol(*c)) {
        return Err(format!("symbol outside the alphabet: {c:?}"));
    }
    println!("{}", format_with_separator(&raw));
    Ok(())
}

fn run_healthcheck(args: &[String]) -> Result<(), String> {
    let mut json_mode = false;
    let mut tail: Vec<String> = Vec::new();
    for arg in args {
        if arg == "--json" {
            json_mode = true;
        } else {
            tail.push(arg.clone());
        }
    }

    let opts = parse_emit_flags(&tail, false, env_lookup)?;
    let (ok, report) = healthcheck(&opts.config, json_mode)?;
    println!("{}", report);

    if ok {
        Ok(())
    } else {
        Err("healthcheck failed".to_string())
    }
}

fn healthcheck(config: &UidConfig, json_mode: bool) -> Result<(bool, String), String> {
    let sample = generate(config.length, config.with_separator).map_err(|e| e.to_string())?;
    let ok = validate(&sample).is_some() && strip_separators(&sample).len() == config.length;

    let report = if json_mode {
        let payload = json!({
            "ok": ok,
            "config": config,
            "sample_id": sample,
        });
        serde_json::to_string(&payload).map_err(|e| e.to_string())?
    } else {
        format!(
            "ok={} length={} sample={}",
            if ok { "true" } else { "false" },
            config.length,
            sample
        )
    };

    Ok((ok, report))
}

fn run_bench(args: &[String]) -> Result<(), String> {
    let mut opts = parse_emit_flags(args, true, env_lookup)?;
    if opts.count == 0 {
        opts.count = 100_000;
    }

    let generator = UidGen::new(opts.config).map_err(|e| e.to_string())?;
    let start = Instant::now();
    for _ in 0..opts.count {
        let _ = generator.next_uid().map_err(|e| e.to_string())?;
    }
    let gen_secs = start.elapsed().as_secs_f64().max(1e-9);

    let sample = generator.next_uid().map_err(|e| e.to_string())?;
    let start = Instant::now();
    for _ in 0..opts.count {
        let _ = validate(&sample);
    }
    let val_secs = start.elapsed().as_secs_f64().max(1e-9);

    info!(count = opts.count, "bench finished");

    let payload = json!({
        "impl": "rust",
        "length": opts.config.length,
        "with_separator": opts.config.with_separator,
        "n": opts.count,
        "generate_seconds": gen_secs,
        "generate_per_sec": opts.count as f64 / gen_secs,
        "validate_seconds": val_secs,
        "validate_per_sec": opts.count as f64 / val_secs,
    });
    println!(
        "{}",
        serde_json::to_string(&payload).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn run_selftest() -> Result<(), String> {
    for length in 8..=40 {
        for with_separator in [true, false] {
            let uid = generate(length, with_separator).map_err(|e| e.to_string())?;
            if strip_separators(&uid).len() != length {
                return Err(format!("selftest failed: wrong length for {uid}"));
            }
            if validate(&uid).is_none() {
                return Err(format!("selftest failed: {uid} did not validate"));
            }
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        process::exit(2);
    }

    if args[0] == "-h" || args[0] == "--help" || args[0] == "help" {
        print_help();
        return;
    }

    init_tracing();

    let cmd = args[0].as_str();
    let rest = &args[1..];

    let res = match cmd {
        "next" => run_next(rest),
        "stream" => run_stream(rest),
        "validate" => run_validate(rest),
        "parse" => run_parse(rest),
        "format" => run_format(rest),
        "healthcheck" => run_healthcheck(rest),
        "bench" => run_bench(rest),
        "selftest" => run_selftest(),
        _ => Err(format!("unknown command: {}", cmd)),
    };

    if let Err(err) = res {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use micro_uid::{EPOCH, LENGTH_ENV, SEPARATOR_ENV, parse_uid_at};
    use serde_json::Value;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn short_env(name: &str) -> Option<String> {
        match name {
            LENGTH_ENV => Some("5".to_string()),
            SEPARATOR_ENV => Some("yes".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_parse_emit_flags() {
        let opts =
            parse_emit_flags(&args(&["--length", "14", "--no-separator"]), false, no_env).unwrap();
        assert_eq!(opts.config.length, 14);
        assert!(!opts.config.with_separator);
        assert_eq!(opts.count, 0);
    }

    #[test]
    fn test_flags_override_environment() {
        let opts =
            parse_emit_flags(&args(&["--length", "12", "--no-separator"]), false, short_env)
                .unwrap();
        assert_eq!(opts.config.length, 12);
        assert!(!opts.config.with_separator);

        // without a flag the environment value applies and is checked
        assert!(parse_emit_flags(&[], false, short_env).is_err());
        let opts = parse_emit_flags(&[], false, |name: &str| {
            (name == LENGTH_ENV).then(|| "16".to_string())
        })
        .unwrap();
        assert_eq!(opts.config.length, 16);
        assert!(opts.config.with_separator);
    }

    #[test]
    fn test_parse_emit_count_only_when_allowed() {
        let opts = parse_emit_flags(&args(&["--count", "3"]), true, no_env).unwrap();
        assert_eq!(opts.count, 3);
        assert!(parse_emit_flags(&args(&["--count", "3"]), false, no_env).is_err());
    }

    #[test]
    fn test_parse_emit_rejects_bad_input() {
        assert!(parse_emit_flags(&args(&["--length"]), false, no_env).is_err());
        assert!(parse_emit_flags(&args(&["--length", "x"]), false, no_env).is_err());
        assert!(parse_emit_flags(&args(&["--length", "7"]), false, no_env).is_err());
        assert!(parse_emit_flags(&args(&["--bogus"]), false, no_env).is_err());
        assert!(parse_emit_flags(&args(&["--json"]), false, no_env).is_err());
        assert!(parse_emit_flags(&args(&["--json"]), true, no_env).is_err());
    }

    #[test]
    fn test_render_parsed() {
        let now = Utc.timestamp_opt(EPOCH + 200, 0).unwrap();
        let parsed = parse_uid_at("6tt-ttwx-78t", now).unwrap();

        let out: Value = serde_json::from_str(&render_parsed(&parsed, true).unwrap()).unwrap();
        assert_eq!(out["raw"], "6tt-ttwx-78t");
        assert_eq!(out["compact"], "6ttttwx78t");
        assert_eq!(out["elapsed"], 100);
        assert_eq!(out["timestamp"], "2024-12-31T20:01:40-04:00");
        assert_eq!(out["unix"], EPOCH + 100);

        let plain = render_parsed(&parsed, false).unwrap();
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(
            lines,
            [
                "raw=6tt-ttwx-78t",
                "compact=6ttttwx78t",
                "elapsed=100",
                "timestamp=2024-12-31T20:01:40-04:00",
            ]
        );
    }

    #[test]
    fn test_parse_command_args() {
        assert!(run_parse(&[]).is_err());
        assert!(run_parse(&args(&["8888bc8", "--bogus"])).is_err());
        assert!(run_parse(&args(&["8888bc9", "--json"])).is_err());
        let uid = generate(12, true).unwrap();
        assert!(run_parse(&args(&[uid.as_str(), "--json"])).is_ok());
    }

    #[test]
    fn test_healthcheck_report() {
        let config = UidConfig {
            length: 13,
            with_separator: true,
        };
        let (ok, report) = healthcheck(&config, true).unwrap();
        assert!(ok);
        let out: Value = serde_json::from_str(&report).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["config"]["length"], 13);
        assert_eq!(out["config"]["with_separator"], true);
        let sample = out["sample_id"].as_str().unwrap();
        assert_eq!(strip_separators(sample).len(), 13);

        let (ok, report) = healthcheck(&config, false).unwrap();
        assert!(ok);
        assert!(report.starts_with("ok=true length=13 sample="));
    }

    #[test]
    fn test_validate_and_format_commands() {
        let uid = generate(10, true).unwrap();
        assert!(run_validate(&args(&[uid.as_str()])).is_ok());
        assert!(run_validate(&args(&["not-a-uid"])).is_err());
        assert!(run_validate(&[]).is_err());
        assert!(run_format(&args(&["123456789a"])).is_ok());
        assert!(run_format(&args(&["1234o"])).is_err());
    }

    #[test]
    fn test_selftest() {
        assert!(run_selftest().is_ok());
    }
}
