//! Kolesa command-line client.
//!
//! Thin host over the library: signs in against the backend, keeps the
//! session in a JSON file under the user config directory, and exposes
//! the publication operations the web pages would normally drive.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use kolesa_client::api::types::{
    CreatePublicationRequest, PublicationFilter, SignInRequest, SignUpRequest,
};
use kolesa_client::api::{auth, publications, users};
use kolesa_client::editor::{html, FileUploadService, ImageFile, ImagePipeline, NullSink};
use kolesa_client::{ApiClient, Config, FileStore, SessionStore};

#[derive(Parser, Debug)]
#[command(name = "kolesa", about = "Kolesa marketplace client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Signin {
        email: String,
        password: String,
    },
    /// Create an account and store the session
    Signup {
        username: String,
        first_name: String,
        last_name: String,
        password: String,
    },
    /// End the session locally and on the server
    Logout,
    /// Show the current user's profile
    Profile,
    /// Upgrade the current account to a seller
    BecomeSeller,
    /// Publication listing and lifecycle operations
    #[command(subcommand)]
    Publications(PublicationCommand),
}

#[derive(Subcommand, Debug)]
enum PublicationCommand {
    /// Public feed
    List,
    /// Own publications, optionally filtered (ALL, PUBLISHED, UNPUBLISHED)
    Mine {
        #[arg(long)]
        filter: Option<String>,
    },
    /// One publication by id
    Get { id: String },
    /// Create a publication from a content file, uploading local images
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// HTML or plain-text content file
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// Local image files to upload and append to the content
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Submit as published instead of draft
        #[arg(long)]
        publish: bool,
    },
    /// Delete a publication
    Delete { id: String },
    /// Status transitions
    Publish { id: String },
    Archive { id: String },
    Reject { id: String },
    Review { id: String },
}

fn parse_filter(raw: &str) -> Result<PublicationFilter, String> {
    match raw.to_ascii_uppercase().as_str() {
        "ALL" => Ok(PublicationFilter::All),
        "PUBLISHED" => Ok(PublicationFilter::Published),
        "UNPUBLISHED" => Ok(PublicationFilter::Unpublished),
        other => Err(format!(
            "unknown filter '{}' (expected ALL, PUBLISHED or UNPUBLISHED)",
            other
        )),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a local image file, deriving the MIME type from the extension.
fn read_image(path: &Path) -> Result<ImageFile, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mime = match path
        .extension()
        .map(|e| e.to_ascii_lowercase().to_string_lossy().into_owned())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(ImageFile::new(&name, mime, bytes))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let store = FileStore::open(FileStore::default_path())?;
    let session = SessionStore::new(Arc::new(store));
    let client = ApiClient::new(&config.api_base_url, session.clone());

    match cli.command {
        Command::Signin { email, password } => {
            let auth = auth::sign_in(&client, &SignInRequest { email, password }).await?;
            println!("Signed in as {}", auth.user.id);
        }
        Command::Signup {
            username,
            first_name,
            last_name,
            password,
        } => {
            let auth = auth::sign_up(
                &client,
                &SignUpRequest {
                    username,
                    first_name,
                    last_name,
                    password,
                },
            )
            .await?;
            println!("Account created: {}", auth.user.id);
        }
        Command::Logout => {
            auth::logout(&client).await;
            println!("Logged out");
        }
        Command::Profile => {
            let profile = users::get_profile(&client).await?;
            print_json(&profile)?;
        }
        Command::BecomeSeller => {
            users::become_seller(&client).await?;
            println!("You are a seller now");
        }
        Command::Publications(command) => match command {
            PublicationCommand::List => print_json(&publications::list(&client).await?)?,
            PublicationCommand::Mine { filter } => match filter {
                Some(raw) => {
                    let filter = parse_filter(&raw)?;
                    print_json(&publications::list_mine_filtered(&client, filter).await?)?
                }
                None => print_json(&publications::list_mine(&client).await?)?,
            },
            PublicationCommand::Get { id } => {
                print_json(&publications::get(&client, &id).await?)?
            }
            PublicationCommand::Create {
                title,
                description,
                content_file,
                images,
                publish,
            } => {
                let raw = match content_file {
                    Some(path) => std::fs::read_to_string(path)?,
                    None => String::new(),
                };

                // Run the content through the editor pipeline so local
                // images and any inline base64 end up as remote URLs.
                let uploader = FileUploadService::new(&config, session.access_token());
                let pipeline = ImagePipeline::new(uploader, NullSink);
                pipeline.set_content(&html::text_to_html(&raw));

                for path in images {
                    let file = read_image(&path)?;
                    pipeline.upload_and_insert(file, None).await?;
                }
                pipeline.reconcile_base64().await;

                let request = CreatePublicationRequest {
                    title,
                    description,
                    content: pipeline.content_html(),
                    images: pipeline.image_sources(),
                    published: publish,
                    price: None,
                    year: None,
                    mileage: None,
                    brand: None,
                    model: None,
                };
                print_json(&publications::create(&client, &request).await?)?
            }
            PublicationCommand::Delete { id } => {
                publications::delete(&client, &id).await?;
                println!("Deleted {}", id);
            }
            PublicationCommand::Publish { id } => {
                print_json(&publications::publish(&client, &id).await?)?
            }
            PublicationCommand::Archive { id } => {
                print_json(&publications::archive(&client, &id).await?)?
            }
            PublicationCommand::Reject { id } => {
                print_json(&publications::reject(&client, &id).await?)?
            }
            PublicationCommand::Review { id } => {
                print_json(&publications::review(&client, &id).await?)?
            }
        },
    }

    Ok(())
}
