//! Parses lyrics and quizzes their kanji from the command line.

mod cli;
mod oracle;

use clap::Parser as _;
use cli::{Cli, Command};
use eyre::WrapErr;
use ichiran::IchiranCli;
use kashi::{
    document::Document,
    oracle::Oracle,
    quiz::{self, DifficultyOrder, QuizOptions},
    reading::{DictionaryConverter, IchiranConverter, KanaConverter, ReadingService},
    verification::{VerificationOutcome, VerificationSession},
    Credentials, ParseOptions, ParseResult, Parser,
};
use oracle::HttpOracle;
use std::{path::Path, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let reading_service = reading_service(&cli)?;
    let oracle: Arc<dyn Oracle> =
        Arc::new(HttpOracle::new(cli.oracle_url.as_str()).wrap_err("Failed to create oracle")?);
    let parser = Parser::new(reading_service).with_oracle(Arc::clone(&oracle));
    let credentials = cli.api_key.map(|api_key| {
        let credentials = Credentials::new(api_key);
        match cli.model {
            Some(model) => credentials.with_model(model),
            None => credentials,
        }
    });

    match cli.command {
        Command::Parse { file, ai, json } => {
            if ai && credentials.is_none() {
                tracing::warn!("No API key set, parsing without the oracle");
            }
            let options = ParseOptions {
                use_ai: ai,
                credentials,
            };
            let result = parse_file(&parser, &file, &options).await?;
            if json {
                let json = serde_json::to_string_pretty(&result)
                    .wrap_err("Failed to serialize result")?;
                println!("{json}");
            } else {
                print_lines(&result);
            }
        }
        Command::Quiz {
            file,
            limit,
            hard,
            options,
            exclude,
        } => {
            let result = parse_file(&parser, &file, &ParseOptions::local()).await?;
            let order = if hard {
                DifficultyOrder::Hard
            } else {
                DifficultyOrder::Easy
            };
            let quiz_options = QuizOptions {
                shuffle: false,
                limit,
                exclude: exclude.into_iter().collect(),
            };
            let ordered = quiz::sort_by_difficulty(&result.all_tokens, order);
            let queue = quiz::create_quiz_queue(&ordered, &quiz_options);
            if queue.is_empty() {
                println!("No kanji to quiz");
            }
            for (i, token) in queue.iter().enumerate() {
                println!("{}. {}", i + 1, token.text());
                let answers = quiz::generate_answer_options(token, &result.all_tokens, options);
                for (answer, label) in answers.iter().zip('a'..='z') {
                    let mark = if answer.is_correct { "*" } else { " " };
                    println!("   {mark} {label}) {}", answer.text);
                }
            }
        }
        Command::Stats { file, json } => {
            let result = parse_file(&parser, &file, &ParseOptions::local()).await?;
            let stats = quiz::get_stats(&result.all_tokens);
            if json {
                let json =
                    serde_json::to_string_pretty(&stats).wrap_err("Failed to serialize stats")?;
                println!("{json}");
            } else {
                println!("tokens:       {}", stats.total_tokens);
                println!("kanji:        {}", stats.kanji_count);
                println!("unique kanji: {}", stats.unique_kanji_count);
                println!("hiragana:     {}", stats.hiragana_count);
                println!("katakana:     {}", stats.katakana_count);
                println!("other:        {}", stats.other_count);
            }
        }
        Command::Lookup { file, text } => {
            let result = parse_file(&parser, &file, &ParseOptions::local()).await?;
            let Some(token_id) = result
                .all_tokens
                .iter()
                .find(|t| t.text() == text)
                .map(|t| t.id())
            else {
                eyre::bail!("No token '{text}' in {}", file.display());
            };
            let document = Document::new(result).shared();
            let session = VerificationSession::new(
                oracle,
                credentials.unwrap_or_else(|| Credentials::new("")),
            );
            match session.lookup(&document, token_id).await {
                VerificationOutcome::Applied(verification)
                | VerificationOutcome::Fallback(verification)
                | VerificationOutcome::Cached(verification) => {
                    println!("{text} 【{}】", verification.reading);
                    if let Some(definition) = verification.definition {
                        println!("  {definition}");
                    }
                    if let Some(notes) = verification.notes {
                        println!("  ({notes})");
                    }
                }
                VerificationOutcome::Ineligible => println!("'{text}' is not a kanji token"),
                VerificationOutcome::Stale | VerificationOutcome::NotFound => {
                    println!("'{text}' could not be looked up")
                }
            }
        }
    }

    Ok(())
}

fn reading_service(cli: &Cli) -> eyre::Result<Arc<dyn ReadingService>> {
    if let Some(dictionary) = &cli.dictionary {
        let converter = DictionaryConverter::from_json_file(dictionary)
            .wrap_err_with(|| format!("Failed to load dictionary {}", dictionary.display()))?;
        tracing::info!("Loaded {} dictionary entries", converter.len());
        Ok(Arc::new(converter))
    } else if let Some(ichiran) = &cli.ichiran {
        tracing::info!("Reading with ichiran at {}", ichiran.display());
        Ok(Arc::new(IchiranConverter::new(IchiranCli::new(
            ichiran.clone(),
        ))))
    } else {
        tracing::info!("No dictionary or ichiran given, only kana will be read");
        Ok(Arc::new(KanaConverter))
    }
}

async fn parse_file(
    parser: &Parser,
    path: &Path,
    options: &ParseOptions,
) -> eyre::Result<ParseResult> {
    let text = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(parser.parse(&text, options).await)
}

fn print_lines(result: &ParseResult) {
    for (i, line) in result.parsed_lines.iter().enumerate() {
        let text = line.iter().map(|t| t.text()).collect::<String>();
        let readings = line
            .iter()
            .map(|t| {
                if t.has_distinct_reading() {
                    format!("{}({})", t.text(), t.reading())
                } else {
                    t.text().to_string()
                }
            })
            .collect::<String>();
        let romaji = line
            .iter()
            .filter(|t| t.token_type().needs_reading())
            .map(|t| t.romaji())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{text}");
        println!("  {readings}");
        println!("  {romaji}");
        if let Some(translation) = result.line_translations.get(i) {
            println!("  {translation}");
        }
    }
}
