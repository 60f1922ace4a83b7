use anyhow::Result;
use clap::{Parser, Subcommand};
use doc_qa::commands::{
    DEFAULT_SESSION, ask_question, clear_documents, clear_session, ingest_document,
    list_sessions, search, show_history, show_session_stats, show_status,
};
use doc_qa::config::{Config, get_config_dir, run_interactive_config, show_config};
use doc_qa::retrieval::RankParams;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-qa")]
#[command(about = "Ask questions about a document using hybrid semantic and keyword search")]
#[command(version)]
struct Cli {
    /// Base directory for configuration, chunks and chat history (default: ~/.doc-qa)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Replace the active document with a text or markdown file
    Ingest {
        /// Path of the document to ingest
        file: PathBuf,
    },
    /// Ask a question about the active document
    Ask {
        question: String,
        /// Chat session the exchange is recorded in
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Show the passages that best match a query
    Search {
        query: String,
        /// Number of passages to return
        #[arg(long)]
        top_k: Option<usize>,
        /// Weight of the embedding similarity
        #[arg(long)]
        semantic_weight: Option<f32>,
        /// Weight of the keyword (BM25) score
        #[arg(long)]
        bm25_weight: Option<f32>,
    },
    /// Print the messages of a chat session
    History {
        #[arg(default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Show message counts for a chat session
    Stats {
        #[arg(default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// List chat sessions
    Sessions,
    /// Delete a chat session
    Clear {
        #[arg(default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Remove the active document and its stored chunks
    ClearDocuments,
    /// Show Ollama, document and session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&base_dir)?;
            } else {
                run_interactive_config(&base_dir)?;
            }
        }
        Commands::Ingest { file } => {
            ingest_document(Config::load(&base_dir)?, &file).await?;
        }
        Commands::Ask { question, session } => {
            ask_question(Config::load(&base_dir)?, &question, &session).await?;
        }
        Commands::Search {
            query,
            top_k,
            semantic_weight,
            bm25_weight,
        } => {
            let config = Config::load(&base_dir)?;
            let defaults = config.retrieval.search_params();
            let params = RankParams {
                top_k: top_k.unwrap_or(defaults.top_k),
                semantic_weight: semantic_weight.unwrap_or(defaults.semantic_weight),
                bm25_weight: bm25_weight.unwrap_or(defaults.bm25_weight),
            };
            search(config, &query, params).await?;
        }
        Commands::History { session } => {
            show_history(Config::load(&base_dir)?, &session).await?;
        }
        Commands::Stats { session } => {
            show_session_stats(Config::load(&base_dir)?, &session).await?;
        }
        Commands::Sessions => {
            list_sessions(Config::load(&base_dir)?).await?;
        }
        Commands::Clear { session } => {
            clear_session(Config::load(&base_dir)?, &session).await?;
        }
        Commands::ClearDocuments => {
            clear_documents(Config::load(&base_dir)?).await?;
        }
        Commands::Status => {
            show_status(Config::load(&base_dir)?).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn ask_uses_default_session() {
        let cli = Cli::try_parse_from(["doc-qa", "ask", "What is this?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question, session } = parsed.command {
                assert_eq!(question, "What is this?");
                assert_eq!(session, DEFAULT_SESSION);
            } else {
                panic!("expected ask command");
            }
        }
    }

    #[test]
    fn ask_with_session() {
        let cli = Cli::try_parse_from(["doc-qa", "ask", "Why?", "--session", "s1"]);

        if let Ok(parsed) = cli {
            if let Commands::Ask { session, .. } = parsed.command {
                assert_eq!(session, "s1");
            } else {
                panic!("expected ask command");
            }
        } else {
            panic!("ask with --session should parse");
        }
    }

    #[test]
    fn search_overrides() {
        let cli = Cli::try_parse_from([
            "doc-qa",
            "search",
            "capital",
            "--top-k",
            "3",
            "--bm25-weight",
            "0.5",
        ]);

        if let Ok(parsed) = cli {
            if let Commands::Search {
                query,
                top_k,
                semantic_weight,
                bm25_weight,
            } = parsed.command
            {
                assert_eq!(query, "capital");
                assert_eq!(top_k, Some(3));
                assert_eq!(semantic_weight, None);
                assert_eq!(bm25_weight, Some(0.5));
            } else {
                panic!("expected search command");
            }
        } else {
            panic!("search with overrides should parse");
        }
    }

    #[test]
    fn data_dir_is_global() {
        let cli = Cli::try_parse_from(["doc-qa", "status", "--data-dir", "/tmp/qa"]);

        if let Ok(parsed) = cli {
            assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/qa")));
            assert!(matches!(parsed.command, Commands::Status));
        } else {
            panic!("status with --data-dir should parse");
        }
    }

    #[test]
    fn clear_documents_command() {
        let cli = Cli::try_parse_from(["doc-qa", "clear-documents"]);
        assert!(matches!(
            cli.map(|parsed| parsed.command),
            Ok(Commands::ClearDocuments)
        ));
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["doc-qa", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn ingest_requires_file() {
        let cli = Cli::try_parse_from(["doc-qa", "ingest"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["doc-qa", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["doc-qa", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
