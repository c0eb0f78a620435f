use std::{
    env,
    fs,
    io::{self, BufRead, Write},
    process,
};
use gloam::{lex, parse, Engine, Error};

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only log when asked to.
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

#[derive(Default)]
struct Args {
    script: Option<String>,
    dump_tokens: bool,
    dump_ast: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--tokens" => args.dump_tokens = true,
            "--ast" => args.dump_ast = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            path if args.script.is_none() => args.script = Some(path.to_owned()),
            extra => return Err(format!("unexpected argument '{}'", extra)),
        }
    }
    Ok(args)
}

fn dump(args: &Args, code: &str) {
    if !args.dump_tokens && !args.dump_ast {
        return;
    }
    let tokens = match lex::scan(code) {
        Ok(tokens) => tokens,
        // The real run reports it.
        Err(_) => return,
    };
    if args.dump_tokens {
        lex::print_debug(&tokens);
    }
    if args.dump_ast {
        if let Ok(program) = parse::parse(&tokens) {
            parse::ast::print_debug(&program);
        }
    }
}

fn run_file(engine: &mut Engine, args: &Args, path: &str) -> Result<(), String> {
    let code = fs::read_to_string(path)
        .map_err(|err| format!("could not read file '{}': {}", path, err))?;
    dump(args, &code);
    engine.evaluate_source(&code).map_err(|err| err.to_string())
}

fn run_prompt(engine: &mut Engine, args: &Args) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };
        dump(args, &line);

        match engine.evaluate_source(&line) {
            Ok(()) => {},
            // A bare expression is not a statement; show its value instead.
            Err(err @ Error::Parse(_)) => match engine.evaluate_expr(&line) {
                Ok(value) => println!("{}", value),
                Err(_) => eprintln!("{}", err),
            },
            Err(err) => eprintln!("{}", err),
        }
    }
}

fn main() {
    init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\nusage: gloam [--tokens] [--ast] [script]", msg);
            process::exit(64);
        },
    };

    let mut engine = Engine::default();
    match &args.script {
        Some(path) => if let Err(msg) = run_file(&mut engine, &args, path) {
            eprintln!("{}", msg);
            process::exit(70);
        },
        None => if let Err(err) = run_prompt(&mut engine, &args) {
            eprintln!("{}", err);
            process::exit(74);
        },
    }
}
