//! Registration funnel CLI — entry point.
//!
//! Each invocation mounts a fresh session on top of the file-backed
//! progress store, the way a browser page reload rehydrates from local
//! storage. Run the steps in order: `edit` until the form is complete,
//! `register`, then `pay`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use funnel::submitter::{payment_link, reference_from_query};
use funnel::{
    ApiClient, Config, Field, FileProgressStore, FlowRouter, FunnelError, PaymentProof,
    ProgressStore, Step,
};

#[derive(Parser)]
#[command(name = "funnel")]
#[command(about = "Event registration: form, payment proof, ticket", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current ticket price
    Offer,

    /// Show saved progress
    Status,

    /// Update registration form fields
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        roll_number: Option<String>,
        #[arg(long)]
        contact_number: Option<String>,
        /// BTech or MCA/MTech
        #[arg(long)]
        degree: Option<String>,
        /// 1st, 2nd, 3rd, 4th, NA or Other
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        year_other: Option<String>,
        /// Electrical, Civil, AI/ML, MNC, MBA, MCA, ECE, NA or Other
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        branch_other: Option<String>,
    },

    /// Validate the form and create the registration
    Register,

    /// Upload payment proof for a registration
    Pay {
        /// Registration reference, or the payment link printed by `register`
        #[arg(long = "ref")]
        reference: Option<String>,
        /// Screenshot or PDF of the payment
        #[arg(long)]
        proof: PathBuf,
    },

    /// Discard saved progress
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let api = ApiClient::from_config(&config)?;
    let store = FileProgressStore::open(&config.state_dir)?;
    let mut router = FlowRouter::mount(api, store);

    match cli.command {
        Commands::Offer => {
            let offer = router.offer().await;
            match offer.badge() {
                Some(badge) => println!("Ticket price: {} ({badge})", offer.display_price()),
                None => println!("Ticket price: {}", offer.display_price()),
            }
        }

        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(router.draft())?);
            match router.store().load_reference() {
                Some(reference) => println!("Registered: {}", payment_link(&reference)),
                None => println!("Not registered yet"),
            }
        }

        Commands::Edit {
            name,
            email,
            roll_number,
            contact_number,
            degree,
            year,
            year_other,
            branch,
            branch_other,
        } => {
            let edits = [
                (Field::Name, name),
                (Field::Email, email),
                (Field::RollNumber, roll_number),
                (Field::ContactNumber, contact_number),
                (Field::Degree, degree),
                (Field::Year, year),
                (Field::YearOther, year_other),
                (Field::Branch, branch),
                (Field::BranchOther, branch_other),
            ];
            for (field, value) in edits {
                if let Some(value) = value {
                    router.set_field(field, value)?;
                }
            }
            println!("{}", serde_json::to_string_pretty(router.draft())?);
        }

        Commands::Register => match router.submit_registration().await {
            Ok(reference) => {
                println!("Registered as {reference}");
                println!("Continue at {}", payment_link(&reference));
            }
            Err(FunnelError::Validation(errors)) => {
                for e in &errors {
                    eprintln!("{}: {}", e.field.as_str(), e.message);
                }
                anyhow::bail!("registration form has {} error(s)", errors.len());
            }
            Err(e) => return Err(e.into()),
        },

        Commands::Pay { reference, proof } => {
            let reference = reference.as_deref().and_then(|raw| {
                reference_from_query(raw).or_else(|| funnel::RegistrationReference::parse(raw))
            });
            if let Step::Register = router.open_payment(reference) {
                anyhow::bail!("no registration reference given; run `funnel register` first");
            }

            router.select_proof(PaymentProof::from_path(&proof)?)?;
            let offer = router.offer().await;
            info!("Uploading proof for a {} ticket", offer.display_price());

            let outcome = router.finalize_payment().await?;
            if let Some(mismatch) = &outcome.mismatch {
                eprintln!("warning: {mismatch}");
            }
            match router.step() {
                Step::Done { ticket } => {
                    println!("{}", serde_json::to_string_pretty(ticket)?);
                    println!("Save as {}", ticket.file_name());
                }
                _ => println!("Payment for {} submitted for verification", outcome.reference),
            }
        }

        Commands::Reset => {
            let mut store = router.into_store();
            store.clear_all()?;
            println!("Saved progress cleared");
        }
    }

    Ok(())
}
