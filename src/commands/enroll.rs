use clap::{Args, Subcommand};
use uuid::Uuid;

use aulanet_core::{EnrollmentStatus, EnrollmentUpdate, PersonKey};

use super::{Context, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct EnrollCommand {
    #[command(subcommand)]
    pub command: EnrollSubcommand,
}

#[derive(Subcommand)]
pub enum EnrollSubcommand {
    /// List enrollments, optionally for one offering
    List {
        /// Filter by offering id
        #[arg(long)]
        offering: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Enroll one person in an offering
    Add {
        /// National identity number
        person: String,

        /// Offering id
        offering: String,

        /// Status (registered, approved, failed, not-taken, pending)
        #[arg(long, default_value = "registered")]
        status: String,
    },

    /// Enroll several people in one offering, skipping duplicates
    Batch {
        /// Offering id
        offering: String,

        /// National identity number (can be repeated)
        #[arg(long = "person", value_name = "RUT", required = true)]
        people: Vec<String>,

        /// Status (registered, approved, failed, not-taken, pending)
        #[arg(long, default_value = "registered")]
        status: String,
    },

    /// Update fields of an enrollment
    Set {
        /// Enrollment id
        id: String,

        /// Status (registered, approved, failed, not-taken, pending)
        #[arg(long)]
        status: Option<String>,

        /// Replace the score list (can be repeated)
        #[arg(long = "score", value_name = "SCORE")]
        scores: Vec<f64>,

        #[arg(long)]
        final_score: Option<f64>,

        /// Attendance percentage
        #[arg(long)]
        attendance: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Withdraw an enrollment
    Rm {
        /// Enrollment id
        id: String,
    },
}

impl EnrollCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ctx = Context::connect(config).await?;

        match &self.command {
            EnrollSubcommand::List { offering, format } => {
                let mut enrollments = ctx.store.read(|s| s.enrollments());
                if let Some(offering) = offering {
                    enrollments.retain(|e| &e.offering == offering);
                }
                if enrollments.is_empty() {
                    println!("No enrollments found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&enrollments)?)
                    }
                    OutputFormat::Text => {
                        for enrollment in &enrollments {
                            println!("{}  {}", enrollment.id, enrollment);
                        }
                        println!("\nTotal: {} enrollment(s)", enrollments.len());
                    }
                }
            }

            EnrollSubcommand::Add {
                person,
                offering,
                status,
            } => {
                let status: EnrollmentStatus = status.parse().map_err(|e: String| e)?;
                let enrollment = ctx
                    .gateway
                    .enroll(&PersonKey::new(person), offering, status)
                    .await?;
                println!("Enrolled: {}", enrollment);
            }

            EnrollSubcommand::Batch {
                offering,
                people,
                status,
            } => {
                let status: EnrollmentStatus = status.parse().map_err(|e: String| e)?;
                let keys: Vec<PersonKey> = people.iter().map(|p| PersonKey::new(p)).collect();
                let outcome = ctx.gateway.enroll_batch(&keys, offering, status).await?;
                println!(
                    "Enrolled {} into {}, skipped {} duplicate(s)",
                    outcome.applied, offering, outcome.skipped
                );
            }

            EnrollSubcommand::Set {
                id,
                status,
                scores,
                final_score,
                attendance,
                notes,
            } => {
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid enrollment id '{}'", id))?;
                let status = match status {
                    Some(s) => Some(s.parse::<EnrollmentStatus>().map_err(|e: String| e)?),
                    None => None,
                };
                let update = EnrollmentUpdate {
                    status,
                    scores: if scores.is_empty() {
                        None
                    } else {
                        Some(scores.clone())
                    },
                    final_score: *final_score,
                    attendance: *attendance,
                    notes: notes.clone(),
                };

                ctx.gateway.update_enrollment(&id, update).await?;
                if let Some(enrollment) = ctx.store.read(|s| s.get_enrollment(&id)) {
                    println!("Updated: {}", enrollment);
                }
            }

            EnrollSubcommand::Rm { id } => {
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid enrollment id '{}'", id))?;
                ctx.gateway.withdraw(&id).await?;
                println!("Withdrawn {}", id);
            }
        }

        Ok(())
    }
}
