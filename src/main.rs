use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info};

use voting_client::{
    camera::StillCamera,
    model::Credentials,
    session::{AuthManager, FileStore},
    ApiClient, Config, Error, Workflow, WorkflowSettings,
};

const PROGRAM_NAME: &str = "voting-client";

const ABOUT_TEXT: &str = "Sign in, verify your identity with a photo, and cast your vote.

EXIT CODES:
     0: Success.
     1: Error.
   255: Ran successfully, but the backend's vote log failed verification.";

/// Construct the CLI configuration.
fn cli() -> Command {
    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file to use instead of Voting.toml")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and remember the session")
                .arg(Arg::new("voter-id").long("voter-id").required(true))
                .arg(Arg::new("dob").long("dob").required(true))
                .arg(Arg::new("email").long("email").required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the current session"))
        .subcommand(
            Command::new("vote")
                .about("Verify your identity with a photo and cast your vote")
                .arg(
                    Arg::new("photo")
                        .long("photo")
                        .help("Image file to use as the camera feed")
                        .required(true),
                )
                .arg(
                    Arg::new("candidate")
                        .long("candidate")
                        .help("The candidate to vote for")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("verify-vote")
                .about("Check that a voter's vote was recorded")
                .arg(Arg::new("voter-id").required(true)),
        )
        .subcommand(Command::new("verify-chain").about("Check the integrity of the vote log"))
}

/// The message shown to the voter for a failed step.
fn describe(err: &Error) -> String {
    match err {
        Error::Upload(_) => format!("Failed to upload photo: {err}"),
        Error::VoteSubmission(_) => format!("Failed to submit vote: {err}"),
        Error::Network(_) => format!("Network error: {err}"),
        Error::CameraAccess(_) => {
            format!("Unable to access camera. Please grant camera permissions. ({err})")
        }
        _ => err.to_string(),
    }
}

/// Get a required argument. Clap guarantees these are present.
fn required<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

async fn vote(auth: &mut AuthManager, config: &Config, args: &ArgMatches) -> Result<(), Error> {
    let camera = StillCamera::new(required(args, "photo"));
    let mut workflow = Workflow::start(auth, camera, WorkflowSettings::from_config(config))?;

    workflow.init_camera().await?;
    workflow.capture()?;
    workflow.confirm_photo().await?;

    let receipt = workflow.submit_vote(Some(required(args, "candidate"))).await?;
    println!("Vote submitted successfully! Your vote has been recorded securely.");
    if let Some(receipt) = &receipt.receipt {
        println!("Receipt: {receipt}");
    }

    workflow.finish(auth).await?;
    println!("Thank you for voting! You have been logged out.");
    Ok(())
}

/// Run the requested command and return the exit code.
async fn run(args: &ArgMatches) -> Result<u8, Error> {
    let config = match args.get_one::<String>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let api = ApiClient::from_config(&config);
    let store = Arc::new(FileStore::new(config.session_dir()));
    let mut auth = AuthManager::new(api.clone(), store);

    match args.subcommand() {
        Some(("login", sub)) => {
            let credentials = Credentials::new(
                required(sub, "voter-id"),
                required(sub, "dob"),
                required(sub, "email"),
            );
            let login = auth.login(&credentials).await?;
            let name = login.voter_info.name().unwrap_or(credentials.voter_id.as_str());
            println!("Logged in as {name}.");
        }
        Some(("logout", _)) => {
            auth.logout()?;
            println!("Logged out.");
        }
        Some(("vote", sub)) => vote(&mut auth, &config, sub).await?,
        Some(("verify-vote", sub)) => match api.vote_proof(required(sub, "voter-id")).await? {
            Some(proof) => {
                println!("Vote found in block {} ({}).", proof.block_index, proof.block_hash);
                println!("Recorded at {}, vote hash {}.", proof.timestamp, proof.vote_hash);
            }
            None => println!("Vote not found."),
        },
        Some(("verify-chain", _)) => {
            let status = api.chain_status().await?;
            if status.valid {
                println!("Vote log intact ({} blocks).", status.total_blocks);
            } else {
                match status.error_at_block {
                    Some(block) => println!("Vote log tampered with at block {block}."),
                    None => println!("Vote log failed verification."),
                }
                return Ok(255);
            }
        }
        _ => unreachable!("clap requires a subcommand"),
    }

    Ok(0)
}

#[tokio::main]
async fn main() {
    // Set up logging.
    if let Err(e) = log4rs::init_file("log4rs.yaml", Default::default()) {
        eprintln!("Failed to initialise logging: {e}");
    }
    info!("Initialised logging");

    let args = cli().get_matches();
    let exit_code = match run(&args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("{}", describe(&err));
            1
        }
    };
    std::process::exit(exit_code.into())
}
