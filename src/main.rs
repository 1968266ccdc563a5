use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genstudio::app::Studio;
use genstudio::builders::{
    ImageParams, LogoParams, SocialPostParams, SpeechParams, SummaryParams, TranslationParams,
    VideoParams,
};
use genstudio::events::{EventSink, GenerationEvent};
use genstudio::models::{LanguageSpec, MediaBlob, Platform, QualityTier, Tone};
use genstudio::GenerationError;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "genstudio")]
#[command(about = "Generate marketing copy, images, logos, video and speech")]
struct CliArgs {
    /// Use the higher quality (slower) model tier.
    #[arg(long, global = true)]
    pro: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a social media post
    Post {
        topic: String,
        #[arg(long, value_enum, default_value_t = Platform::Instagram)]
        platform: Platform,
        #[arg(long, value_enum, default_value_t = Tone::Professional)]
        tone: Tone,
        #[arg(long, default_value = "English")]
        language: String,
        #[arg(long)]
        dialect: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        no_hashtags: bool,
    },
    /// Generate an image
    Image {
        description: String,
        /// Ratio (16:9) or named format (instagram story, A4 landscape)
        #[arg(long, default_value = "1:1")]
        size: String,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        avoid: Option<String>,
    },
    /// Generate several logo concepts
    Logo {
        brand_name: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        style: Option<String>,
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Generate a short video clip
    Video {
        description: String,
        #[arg(long, default_value = "16:9")]
        size: String,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        /// Image file to animate
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },
    /// Read text aloud
    Speech {
        text: String,
        #[arg(long)]
        voice: Option<String>,
        #[arg(long)]
        delivery: Option<String>,
    },
    /// Translate text
    Translate {
        text: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        dialect: Option<String>,
    },
    /// Summarize text or a text file
    Summarize {
        text: Option<String>,
        #[arg(long, value_name = "FILE", conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long, default_value = "English")]
        language: String,
        #[arg(long, default_value_t = 120)]
        max_words: usize,
    },
}

fn language(name: &str, dialect: Option<String>) -> LanguageSpec {
    match dialect {
        Some(dialect) => LanguageSpec::new(name).with_dialect(dialect),
        None => LanguageSpec::new(name),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn save(studio: &Studio, name: &str, blob: &MediaBlob) -> Result<()> {
    let path = studio.save_artifact(name, blob)?;
    println!("{}", path.display());
    Ok(())
}

fn log_event(event: &GenerationEvent) {
    match event {
        GenerationEvent::RetryScheduled { attempt, delay } => {
            info!("Retry {} scheduled in {:?}", attempt, delay)
        }
        GenerationEvent::JobSubmitted { handle } => info!("Job submitted: {}", handle),
        GenerationEvent::JobPolled { poll, done, .. } => {
            info!("Job poll {}: {}", poll, if *done { "finished" } else { "running" })
        }
        GenerationEvent::InstanceFailed { index, category } => {
            warn!("Concept {} failed: {}", index + 1, category)
        }
        other => tracing::debug!("{:?}", other),
    }
}

async fn run(studio: &Studio, args: CliArgs, events: &EventSink) -> Result<()> {
    let tier = if args.pro {
        QualityTier::Pro
    } else {
        QualityTier::Standard
    };

    match args.command {
        Command::Post {
            topic,
            platform,
            tone,
            language: lang,
            dialect,
            industry,
            no_hashtags,
        } => {
            let params = SocialPostParams {
                topic,
                platform,
                language: language(&lang, dialect),
                tone,
                industry,
                include_hashtags: !no_hashtags,
                tier,
            };
            print_json(&studio.social_post(&params, events).await?)
        }
        Command::Image {
            description,
            size,
            style,
            avoid,
        } => {
            let params = ImageParams {
                description,
                style,
                size,
                constraints: None,
                negative_prompt: avoid,
                tier,
            };
            save(studio, "image", &studio.image(&params, events).await?)
        }
        Command::Logo {
            brand_name,
            industry,
            style,
            count,
        } => {
            let params = LogoParams {
                brand_name,
                industry,
                style,
                tier,
            };
            let concepts = studio.logo_concepts(&params, count, events).await?;
            for (n, artifact) in concepts.artifacts.iter().enumerate() {
                if let Some(blob) = artifact.media() {
                    save(studio, &format!("logo-{}", n + 1), blob)?;
                }
            }
            for (index, failure) in &concepts.failures {
                eprintln!("concept {} skipped: {}", index + 1, failure);
            }
            Ok(())
        }
        Command::Video {
            description,
            size,
            style,
            duration,
            image,
        } => {
            let reference_image = match image {
                Some(path) => {
                    let data = std::fs::read(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    Some(MediaBlob::new("", data))
                }
                None => None,
            };
            let params = VideoParams {
                description,
                style,
                size,
                reference_image,
                duration_seconds: duration,
                negative_prompt: None,
                tier,
            };
            save(studio, "video", &studio.video(&params, events).await?)
        }
        Command::Speech {
            text,
            voice,
            delivery,
        } => {
            let params = SpeechParams {
                text,
                voice,
                delivery,
            };
            save(studio, "speech", &studio.speech(&params, events).await?)
        }
        Command::Translate {
            text,
            to,
            from,
            dialect,
        } => {
            let params = TranslationParams {
                text,
                source_language: from,
                target: language(&to, dialect),
                tier,
            };
            println!("{}", studio.translate(&params, events).await?);
            Ok(())
        }
        Command::Summarize {
            text,
            file,
            language: lang,
            max_words,
        } => {
            let content = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("provide text or --file"),
            };
            let params = SummaryParams {
                content,
                language: LanguageSpec::new(lang),
                max_words,
                tier,
            };
            print_json(&studio.summarize(&params, events).await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genstudio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let studio = match Studio::new() {
        Ok(studio) => studio,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let (events, mut receiver) = EventSink::channel();
    let drain = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            log_event(&event);
        }
    });

    let outcome = run(&studio, args, &events).await;
    drop(events);
    let _ = drain.await;

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<GenerationError>() {
                Some(failure) => eprintln!("{}: {}", failure.category, failure.message),
                None => error!("{:#}", e),
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_defaults() {
        let args = CliArgs::try_parse_from(["genstudio", "post", "summer sale"]).unwrap();
        assert!(!args.pro);
        match args.command {
            Command::Post {
                topic,
                platform,
                tone,
                language,
                no_hashtags,
                ..
            } => {
                assert_eq!(topic, "summer sale");
                assert_eq!(platform, Platform::Instagram);
                assert_eq!(tone, Tone::Professional);
                assert_eq!(language, "English");
                assert!(!no_hashtags);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_logo_with_global_pro_flag() {
        let args = CliArgs::try_parse_from([
            "genstudio",
            "logo",
            "Sahra",
            "--industry",
            "cosmetics",
            "--count",
            "4",
            "--pro",
        ])
        .unwrap();
        assert!(args.pro);
        assert!(matches!(args.command, Command::Logo { count: 4, .. }));
    }

    #[test]
    fn test_summarize_rejects_text_and_file_together() {
        let result = CliArgs::try_parse_from([
            "genstudio",
            "summarize",
            "some text",
            "--file",
            "notes.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_language_with_dialect() {
        assert_eq!(
            language("Arabic", Some("Egyptian".to_string())).describe(),
            "Arabic (Egyptian dialect)"
        );
        assert_eq!(language("French", None).describe(), "French");
    }
}
