use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use unitube_core::{
    ApiClient, AppConfig, CacheStore, Comment, CommentRepository, NewUser, Outcome, Session, User,
    UserRepository, Video, VideoRepository,
};

struct App {
    session: Session,
    videos: VideoRepository,
    comments: CommentRepository,
    users: UserRepository,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = AppConfig::load();
    let session = Session::new();
    let client = match ApiClient::from_config(&config.server, session.clone()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("failed to build HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };
    let cache = CacheStore::load_from_dir(config.cache_dir()).await;

    let app = App {
        session: session.clone(),
        videos: VideoRepository::new(client.clone(), cache.clone()),
        comments: CommentRepository::new(client.clone(), cache),
        users: UserRepository::new(client, session),
    };

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // `--as user:pass` signs in before running the command.
    if args.first().map(String::as_str) == Some("--as") {
        if args.len() < 2 {
            usage();
            return ExitCode::FAILURE;
        }
        let creds = args.remove(1);
        args.remove(0);
        let Some((username, password)) = creds.split_once(':') else {
            eprintln!("--as expects user:pass");
            return ExitCode::FAILURE;
        };
        if app.users.login(username, password).await.is_none() {
            eprintln!("login failed for {username}");
            return ExitCode::FAILURE;
        }
    }

    match run(&app, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &App, args: &[String]) -> Result<(), String> {
    let mut words = args.iter().map(String::as_str);
    match words.next() {
        Some("videos") => {
            app.videos.fetch_all().await;
            print_videos(&app.videos.subscribe().borrow());
            Ok(())
        }
        Some("video") => {
            let id = parse_id(words.next())?;
            match app.videos.fetch_by_id(id).await {
                Some(video) => {
                    print_videos(std::slice::from_ref(&video));
                    Ok(())
                }
                None => Err(format!("video {id} not found")),
            }
        }
        Some("videos-of") => {
            let owner = words.next().ok_or("videos-of needs a username")?;
            app.videos.fetch_for_owner(owner).await;
            print_videos(&app.videos.subscribe().borrow());
            Ok(())
        }
        Some("comments") => {
            let video_id = parse_id(words.next())?;
            app.comments.fetch_for_video(video_id).await;
            for comment in app.comments.subscribe().borrow().iter() {
                println!("#{} {}: {}", comment.id, comment.author, comment.text);
            }
            Ok(())
        }
        Some("login") => {
            let username = words.next().ok_or("login needs a username")?;
            let password = words.next().ok_or("login needs a password")?;
            match app.users.login(username, password).await {
                Some(user) => {
                    println!("signed in as {} {}", user.first_name, user.last_name);
                    Ok(())
                }
                None => Err("login failed".to_string()),
            }
        }
        Some("register") => {
            let username = words.next().ok_or("register needs a username")?;
            let first_name = words.next().ok_or("register needs a first name")?;
            let last_name = words.next().ok_or("register needs a last name")?;
            let password = words.next().ok_or("register needs a password")?;
            let photo = words.next().map(PathBuf::from);
            let user = NewUser {
                username: username.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                password: password.to_string(),
            };
            match app.users.create_user(&user, photo.as_deref()).await {
                Outcome::Success => {
                    println!("account created");
                    Ok(())
                }
                Outcome::NameTaken => Err(format!("username {username} is taken")),
                other => Err(format!("registration failed: {other:?}")),
            }
        }
        Some("upload") => {
            let owner = signed_in_user(app).await?;
            let title = words.next().ok_or("upload needs a title")?;
            let description = words.next().ok_or("upload needs a description")?;
            let video_url = words.next().ok_or("upload needs a video url")?;
            let thumbnail_url = words.next().unwrap_or_default();
            let video = Video {
                // Server assigns the real id on create; the next full
                // refresh replaces this placeholder.
                id: 0,
                title: title.to_string(),
                description: description.to_string(),
                owner: owner.username,
                video_url: video_url.to_string(),
                thumbnail_url: thumbnail_url.to_string(),
                uploaded_at: Utc::now(),
                views: 0,
            };
            app.videos.create(video).await;
            print_videos(&app.videos.subscribe().borrow());
            Ok(())
        }
        Some("delete-video") => {
            let owner = signed_in_user(app).await?;
            let id = parse_id(words.next())?;
            app.videos.delete(&owner.username, id).await;
            print_videos(&app.videos.subscribe().borrow());
            Ok(())
        }
        Some("comment") => {
            let author = signed_in_user(app).await?;
            let video_id = parse_id(words.next())?;
            let text: Vec<&str> = words.collect();
            if text.is_empty() {
                return Err("comment needs text".to_string());
            }
            let comment = Comment {
                id: 0,
                video_id,
                author: author.username,
                text: text.join(" "),
                created_at: Utc::now(),
            };
            app.comments.create(comment).await;
            Ok(())
        }
        Some("update-user") => {
            let current = signed_in_user(app).await?;
            let first_name = words.next().ok_or("update-user needs a first name")?;
            let last_name = words.next().ok_or("update-user needs a last name")?;
            let user = User {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                ..current
            };
            match app.users.update_user(user).await {
                Outcome::Success => {
                    println!("profile updated");
                    Ok(())
                }
                Outcome::Unauthorized | Outcome::Forbidden => {
                    // Authorization failure means the token is no longer
                    // valid; drop the session so the next run starts
                    // signed out.
                    app.session.clear().await;
                    Err("not authorized; signed out".to_string())
                }
                other => Err(format!("update failed: {other:?}")),
            }
        }
        Some("delete-user") => {
            let username = words.next().ok_or("delete-user needs a username")?;
            match app.users.delete_user(username).await {
                Outcome::Success => {
                    app.session.clear().await;
                    println!("account deleted");
                    Ok(())
                }
                Outcome::Unauthorized | Outcome::Forbidden => {
                    Err("not authorized to delete that account".to_string())
                }
                other => Err(format!("delete failed: {other:?}")),
            }
        }
        _ => {
            usage();
            Err("unknown command".to_string())
        }
    }
}

async fn signed_in_user(app: &App) -> Result<User, String> {
    app.session
        .current_user()
        .await
        .ok_or_else(|| "sign in first with --as user:pass".to_string())
}

fn parse_id(word: Option<&str>) -> Result<i64, String> {
    word.ok_or("missing id")?
        .parse()
        .map_err(|_| "id must be a number".to_string())
}

fn print_videos(videos: &[Video]) {
    for video in videos {
        println!(
            "#{} {} by {} ({} views) {}",
            video.id, video.title, video.owner, video.views, video.video_url
        );
    }
}

fn usage() {
    eprintln!(
        "usage: unitube [--as user:pass] <command>\n\
         commands:\n\
           videos\n\
           video <id>\n\
           videos-of <owner>\n\
           comments <video-id>\n\
           login <username> <password>\n\
           register <username> <first> <last> <password> [photo]\n\
           upload <title> <description> <video-url> [thumbnail-url]\n\
           delete-video <id>\n\
           comment <video-id> <text...>\n\
           update-user <first> <last>\n\
           delete-user <username>"
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
