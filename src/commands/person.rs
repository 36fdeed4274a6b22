use clap::{Args, Subcommand};

use aulanet_core::{AccessLevel, Person, PersonKey, PersonUpdate};

use super::{Context, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PersonCommand {
    #[command(subcommand)]
    pub command: PersonSubcommand,
}

#[derive(Subcommand)]
pub enum PersonSubcommand {
    /// List people
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a person
    Add {
        /// National identity number
        rut: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        faculty: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        career: Option<String>,

        /// Access level (admin, coordinator, instructor, student)
        #[arg(long, default_value = "student")]
        access: String,
    },

    /// Update fields of a person
    Set {
        /// National identity number
        rut: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        faculty: Option<String>,

        #[arg(long)]
        department: Option<String>,

        /// Access level (admin, coordinator, instructor, student)
        #[arg(long)]
        access: Option<String>,
    },

    /// Remove a person
    Rm {
        /// National identity number
        rut: String,
    },
}

impl PersonCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ctx = Context::connect(config).await?;

        match &self.command {
            PersonSubcommand::List { format } => {
                let people = ctx.store.read(|s| s.people());
                if people.is_empty() {
                    println!("No people found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&people)?),
                    OutputFormat::Text => {
                        for person in &people {
                            println!("{}", person);
                        }
                        println!("\nTotal: {} person(s)", people.len());
                    }
                }
            }

            PersonSubcommand::Add {
                rut,
                first_name,
                last_name,
                email,
                phone,
                faculty,
                department,
                career,
                access,
            } => {
                let access_level: AccessLevel = access.parse().map_err(|e: String| e)?;
                let mut person = Person::new(rut, first_name, last_name)
                    .with_access_level(access_level);
                if let Some(email) = email {
                    person = person.with_email(email);
                }
                if let Some(phone) = phone {
                    person = person.with_phone(phone);
                }
                if let Some(faculty) = faculty {
                    person = person.with_faculty(faculty);
                }
                if let Some(department) = department {
                    person = person.with_department(department);
                }
                if let Some(career) = career {
                    person = person.with_career(career);
                }

                ctx.gateway.add_person(person.clone()).await?;
                println!("Added {}", person);
            }

            PersonSubcommand::Set {
                rut,
                email,
                phone,
                faculty,
                department,
                access,
            } => {
                let access_level = match access {
                    Some(a) => Some(a.parse::<AccessLevel>().map_err(|e: String| e)?),
                    None => None,
                };
                let update = PersonUpdate {
                    email: email.clone(),
                    phone: phone.clone(),
                    faculty: faculty.clone(),
                    department: department.clone(),
                    access_level,
                    ..Default::default()
                };

                let key = PersonKey::new(rut);
                ctx.gateway.update_person(&key, update).await?;
                let person = ctx.store.read(|s| s.get_person(&key));
                if let Some(person) = person {
                    println!("Updated {}", person);
                }
            }

            PersonSubcommand::Rm { rut } => {
                let key = PersonKey::new(rut);
                ctx.gateway.delete_person(&key).await?;
                println!("Removed {}", key);
            }
        }

        Ok(())
    }
}
