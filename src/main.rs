use std::process::ExitCode;
use std::time::Duration;
use ufetch::application::{Client, Config};
use ufetch::domain::{AbortController, RedirectMode, Request, RequestInit};
use ufetch::infrastructure::NativeEngine;

fn main() -> ExitCode {
    rustls::crypto::ring::default_provider().install_default().ok();

    let args: Vec<String> = std::env::args().collect();

    let cli = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    let config = Config::from_env();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error[ERROR]: failed to create runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    rt.block_on(async_main(cli, config))
}

struct CliArgs {
    url: String,
    method: Option<String>,
    headers: Vec<(String, String)>,
    data: Option<String>,
    include: bool,
    redirect: Option<RedirectMode>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut url = None;
    let mut method = None;
    let mut headers = Vec::new();
    let mut data = None;
    let mut include = false;
    let mut redirect = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-X" | "--method" => {
                method = Some(iter.next().ok_or_else(|| format!("missing value for {}\n\n{}", arg, usage()))?.clone());
            }
            "-H" | "--header" => {
                let raw = iter.next().ok_or_else(|| format!("missing value for {}\n\n{}", arg, usage()))?;
                let (name, value) = raw
                    .split_once(':')
                    .ok_or_else(|| format!("malformed header '{}', expected 'Name: value'", raw))?;
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
            "-d" | "--data" => {
                data = Some(iter.next().ok_or_else(|| format!("missing value for {}\n\n{}", arg, usage()))?.clone());
            }
            "-i" | "--include" => include = true,
            "--redirect" => {
                let raw = iter.next().ok_or_else(|| format!("missing value for {}\n\n{}", arg, usage()))?;
                redirect = Some(RedirectMode::parse(raw).map_err(|e| e.message)?);
            }
            "--help" | "-h" => return Err(usage()),
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}\n\n{}", other, usage()));
            }
            other => {
                if url.is_none() {
                    url = Some(other.to_string());
                } else {
                    return Err(format!("unexpected argument: {}\n\n{}", other, usage()));
                }
            }
        }
    }

    match url {
        Some(url) => Ok(CliArgs { url, method, headers, data, include, redirect }),
        None => Err(usage()),
    }
}

fn usage() -> String {
    "usage: ufetch [options] <URL>\n\n\
    Performs an HTTP(S) request and prints the response body.\n\n\
    Options:\n  \
      -X, --method <M>     Request method [default: GET]\n  \
      -H, --header <K: V>  Add a request header (repeatable)\n  \
      -d, --data <BODY>    Request body\n  \
      -i, --include        Print status line and response headers\n  \
      --redirect <MODE>    follow | manual | error [default: follow]\n\n\
    Environment:\n  \
      UFETCH_TIMEOUT  Abort the request after this long (e.g. 5s, 3000ms)\n  \
      UFETCH_UA       User-Agent header value [default: ufetch/0.2]"
        .to_string()
}

async fn async_main(cli: CliArgs, config: Config) -> ExitCode {
    let mut init = RequestInit::new();
    if let Some(method) = &cli.method {
        init = init.method(method.clone());
    }
    for (name, value) in &cli.headers {
        init = init.header(name.clone(), value.clone());
    }
    if let Some(data) = cli.data {
        init = init.body(data);
        if cli.method.is_none() {
            init = init.method("POST");
        }
    }
    if let Some(mode) = cli.redirect {
        init = init.redirect(mode);
    }

    let controller = AbortController::new();
    if let Some(timeout) = config.timeout {
        init = init.signal(controller.signal());
        tokio::spawn(arm_timeout(controller, timeout));
    }

    let request = match Request::new(&cli.url, init) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e.format_stderr());
            return ExitCode::from(e.class.exit_code() as u8);
        }
    };

    let client = Client::with_config(NativeEngine::new(), config);
    match client.fetch(request).await {
        Ok(response) => {
            if cli.include {
                println!("{} {}", response.status(), response.status_text());
                for (name, value) in response.headers() {
                    println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
                }
                println!();
            }
            match response.text().await {
                Ok(text) => {
                    print!("{}", text);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", e.format_stderr());
                    ExitCode::from(e.class.exit_code() as u8)
                }
            }
        }
        Err(e) => {
            eprintln!("{}", e.format_stderr());
            ExitCode::from(e.class.exit_code() as u8)
        }
    }
}

async fn arm_timeout(controller: AbortController, timeout: Duration) {
    tokio::time::sleep(timeout).await;
    controller.abort(Some(&format!("request timed out after {:?}", timeout)));
}
