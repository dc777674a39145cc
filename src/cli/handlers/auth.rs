use std::path::Path;

use crate::cli::commands::CredentialArgs;
use crate::io::identity::{Identity, LocalIdentity};
use crate::model::user::User;

fn print_user(user: &User, message: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("{} {}", message, user.email);
    }
    Ok(())
}

pub fn cmd_signup(
    data_dir: &Path,
    args: CredentialArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = LocalIdentity::new(data_dir);
    let user = identity.sign_up(&args.email, &args.password)?;
    print_user(&user, "signed up as", json)
}

pub fn cmd_login(
    data_dir: &Path,
    args: CredentialArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = LocalIdentity::new(data_dir);
    let user = identity.sign_in(&args.email, &args.password)?;
    print_user(&user, "signed in as", json)
}

pub fn cmd_logout(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    LocalIdentity::new(data_dir).sign_out()?;
    println!("signed out");
    Ok(())
}

pub fn cmd_whoami(data_dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let user = LocalIdentity::new(data_dir).require_user()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{}", user.email);
    }
    Ok(())
}
