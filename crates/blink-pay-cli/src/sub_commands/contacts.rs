use anyhow::Result;
use blink_pay::BlinkClient;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ContactsSubCommand {
    #[command(subcommand)]
    action: ContactsAction,
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List contacts
    List,
    /// Show one contact's details
    Show {
        /// Blink username
        username: String,
    },
    /// Add a contact or update its alias
    SetAlias {
        /// Blink username
        username: String,
        /// Alias to set
        alias: String,
    },
}

pub async fn contacts(client: &BlinkClient, args: &ContactsSubCommand) -> Result<()> {
    match &args.action {
        ContactsAction::List => {
            let contacts = client.contacts().await?;
            if contacts.is_empty() {
                println!("No contacts found.");
                return Ok(());
            }
            for (idx, contact) in contacts.iter().enumerate() {
                println!(
                    "{}. {} - alias: {}",
                    idx + 1,
                    contact.username,
                    contact.alias.as_deref().unwrap_or("none")
                );
            }
        }
        ContactsAction::Show { username } => match client.contact_by_username(username).await? {
            Some(contact) => {
                println!("Username: {}", contact.username);
                println!("Alias: {}", contact.alias.as_deref().unwrap_or("none"));
                println!("Lightning address: {}", contact.lightning_address());
            }
            None => println!("No contact found for {username}."),
        },
        ContactsAction::SetAlias { username, alias } => {
            let contact = client.set_contact_alias(username, alias).await?;
            println!(
                "Contact updated: {} (alias: {})",
                contact.username,
                contact.alias.as_deref().unwrap_or("none")
            );
        }
    }

    Ok(())
}
