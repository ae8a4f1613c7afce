//! Page configuration command handlers.

use clap::Subcommand;

/// Sub-commands available under `pages`.
#[derive(Debug, Subcommand)]
pub enum PagesCommands {
    /// List every configured page
    List,
    /// Add an active page
    Add {
        /// Unique page name
        #[arg(long)]
        name: String,
        /// CMS source id or absolute page document URL
        #[arg(long)]
        source: String,
    },
    /// Flip a page between active and inactive
    Toggle {
        /// Page id
        id: i64,
    },
    /// Delete a page configuration; its reports are kept
    Remove {
        /// Page id
        id: i64,
    },
}

/// # Errors
///
/// Returns an error if the database operation fails, the page name is
/// taken, or the id does not exist.
pub(crate) async fn run(pool: &sqlx::PgPool, command: PagesCommands) -> anyhow::Result<()> {
    match command {
        PagesCommands::List => run_list(pool).await,
        PagesCommands::Add { name, source } => {
            let (name, source) = (name.trim(), source.trim());
            if name.is_empty() || source.is_empty() {
                anyhow::bail!("page name and source must not be blank");
            }
            let page = argus_db::create_page_config(pool, name, source).await?;
            println!("added page {} ({})", page.page_name, page.id);
            Ok(())
        }
        PagesCommands::Toggle { id } => {
            let page = argus_db::toggle_page_config(pool, id).await?;
            let state = if page.active { "active" } else { "inactive" };
            println!("page {} is now {state}", page.page_name);
            Ok(())
        }
        PagesCommands::Remove { id } => {
            argus_db::delete_page_config(pool, id).await?;
            println!("removed page {id}");
            Ok(())
        }
    }
}

async fn run_list(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let pages = argus_db::list_page_configs(pool).await?;
    if pages.is_empty() {
        println!("no pages configured; run `db seed` or `pages add` first");
        return Ok(());
    }

    println!("{:<6}{:<24}{:<8}SOURCE", "ID", "NAME", "ACTIVE");
    for page in &pages {
        println!(
            "{:<6}{:<24}{:<8}{}",
            page.id,
            page.page_name,
            if page.active { "yes" } else { "no" },
            page.cms_source_id
        );
    }
    Ok(())
}
