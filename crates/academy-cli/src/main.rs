use academy_cli::CliResult;
use academy_cli::seeder::{self, SeedConfig};
use academy_cli::superuser::{self, NewSuperuser};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "academy-cli")]
#[command(about = "IT360 Academy administration tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account with staff and superuser rights
    CreateSuperuser {
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Prompted without echo when omitted
        #[arg(short = 'p', long)]
        password: Option<String>,

        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Fill the database with fake categories, courses and students
    Seed {
        #[arg(long, default_value = "5")]
        categories: usize,

        /// Courses per category
        #[arg(long, default_value = "4")]
        courses: usize,

        #[arg(long, default_value = "50")]
        students: usize,
    },
    /// Delete every user that is not a superuser
    ClearUsers {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let pool = academy_db::init_db_pool()
        .await
        .map_err(|e| e.to_string())?;

    match cli.command {
        Commands::CreateSuperuser {
            email,
            password,
            first_name,
            last_name,
            phone,
        } => {
            let input = NewSuperuser {
                email: prompt_or(email, "Email address")?,
                password: match password {
                    Some(p) => p,
                    None => Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords don't match")
                        .interact()?,
                },
                first_name: prompt_or(first_name, "First name")?,
                last_name: prompt_or(last_name, "Last name")?,
                phone_number: match phone {
                    Some(p) => p,
                    None => Input::new()
                        .with_prompt("Phone number")
                        .allow_empty(true)
                        .interact_text()?,
                },
            };

            superuser::create_superuser(&pool, &input).await?;
            println!("\n✅ Superuser created successfully!");
            println!("   Email: {}", input.email.trim().to_lowercase());
        }
        Commands::Seed {
            categories,
            courses,
            students,
        } => {
            let config = SeedConfig {
                categories,
                courses_per_category: courses,
                students,
            };
            let summary = seeder::seed_all(&pool, &config).await?;
            println!(
                "   {} categories, {} courses, {} students",
                summary.categories, summary.courses, summary.students
            );
        }
        Commands::ClearUsers { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Delete all non-superuser accounts?")
                    .default(false)
                    .interact()?;
            if !confirmed {
                println!("Aborted.");
                return Ok(());
            }
            let removed = superuser::clear_users(&pool).await?;
            println!("✅ Removed {} users", removed);
        }
    }

    Ok(())
}

fn prompt_or(value: Option<String>, prompt: &str) -> CliResult<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}
