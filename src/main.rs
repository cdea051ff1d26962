use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = goto_sms::cli::Cli::parse();

    if let Err(err) = goto_sms::run(cli).await {
        eprintln!("error: {err}");
        if err.needs_reauth() {
            eprintln!("hint: run `goto-sms auth login` to authorize again");
        }
        std::process::exit(1);
    }
}
