use chrono::NaiveDate;
use clap::{Args, Subcommand};

use aulanet_core::{Offering, OfferingCategory, OfferingUpdate};

use super::{Context, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct OfferingCommand {
    #[command(subcommand)]
    pub command: OfferingSubcommand,
}

#[derive(Subcommand)]
pub enum OfferingSubcommand {
    /// List offerings
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create an offering
    Add {
        /// Offering id as assigned by the records service
        id: String,

        #[arg(long)]
        name: String,

        /// Category (course, workshop, seminar, diploma)
        #[arg(long, default_value = "course")]
        category: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        starts: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        ends: Option<String>,

        #[arg(long)]
        capacity: Option<u32>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Update fields of an offering
    Set {
        /// Offering id
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Category (course, workshop, seminar, diploma)
        #[arg(long)]
        category: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        starts: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        ends: Option<String>,

        #[arg(long)]
        capacity: Option<u32>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Remove an offering
    Rm {
        /// Offering id
        id: String,
    },
}

impl OfferingCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ctx = Context::connect(config).await?;

        match &self.command {
            OfferingSubcommand::List { format } => {
                let offerings = ctx.store.read(|s| s.offerings());
                if offerings.is_empty() {
                    println!("No offerings found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&offerings)?)
                    }
                    OutputFormat::Text => {
                        for offering in &offerings {
                            println!("{}", offering);
                        }
                        println!("\nTotal: {} offering(s)", offerings.len());
                    }
                }
            }

            OfferingSubcommand::Add {
                id,
                name,
                category,
                starts,
                ends,
                capacity,
                location,
            } => {
                let category: OfferingCategory = category.parse().map_err(|e: String| e)?;
                let mut offering = Offering::new(id, name, category);

                if let (Some(starts), Some(ends)) = (starts, ends) {
                    let starts = parse_date(starts)?;
                    let ends = parse_date(ends)?;
                    offering = offering.with_dates(starts, ends);
                }
                if let Some(capacity) = capacity {
                    offering = offering.with_capacity(*capacity);
                }
                if let Some(location) = location {
                    offering = offering.with_location(location);
                }

                ctx.gateway.create_offering(offering.clone()).await?;
                println!("Created {}", offering);
            }

            OfferingSubcommand::Set {
                id,
                name,
                category,
                starts,
                ends,
                capacity,
                location,
            } => {
                let category = match category {
                    Some(c) => Some(c.parse::<OfferingCategory>().map_err(|e: String| e)?),
                    None => None,
                };
                let starts_on = match starts {
                    Some(s) => Some(parse_date(s)?),
                    None => None,
                };
                let ends_on = match ends {
                    Some(s) => Some(parse_date(s)?),
                    None => None,
                };
                let update = OfferingUpdate {
                    name: name.clone(),
                    category,
                    starts_on,
                    ends_on,
                    capacity: *capacity,
                    location: location.clone(),
                };

                ctx.gateway.update_offering(id, update).await?;
                if let Some(offering) = ctx.store.read(|s| s.get_offering(id)) {
                    println!("Updated {}", offering);
                }
            }

            OfferingSubcommand::Rm { id } => {
                ctx.gateway.delete_offering(id).await?;
                println!("Removed {}", id);
            }
        }

        Ok(())
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", s))
}
