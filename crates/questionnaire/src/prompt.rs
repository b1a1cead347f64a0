//! Line-oriented prompts that fill in one step of the questionnaire.
//!
//! A blank line keeps whatever the draft already holds, so walking back and
//! forth through the steps never loses an answer. End of input is treated as
//! a request to quit.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::answers::{Answers, AttachmentDraft, ChoiceAnswer, Contact, Quantities};
use crate::options::{AUXILIARY_EQUIPMENT, CABINET_TYPES, DETECTION_IO, EQUIPMENT, TLS_CONNECTIONS};
use crate::review::{NO_FILE, render_review};
use crate::step::Step;

/// What the user asked for after editing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Continue, or submit from the last step.
    Next,
    /// Go back one step.
    Previous,
    /// Leave the questionnaire.
    Quit,
}

/// Reads answers from `R` and writes prompts to `W`.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompter over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give the streams back.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Write a line of text.
    ///
    /// # Errors
    /// Returns the error from the output stream.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Ask a yes/no question. Anything starting with `y` is yes.
    ///
    /// # Errors
    /// Returns errors from either stream.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]: "))?;
        Ok(answer.is_some_and(|text| text.to_ascii_lowercase().starts_with('y')))
    }

    /// Show `step`, let the user edit its answers and ask where to go next.
    ///
    /// # Errors
    /// Returns errors from either stream.
    pub fn edit_step(&mut self, step: Step, answers: &mut Answers) -> io::Result<Navigation> {
        writeln!(self.output)?;
        writeln!(self.output, "{}: {}", step.progress(), step.title())?;
        writeln!(self.output, "{}", step.description())?;
        let completed = match step {
            Step::CabinetType => self.choose(CABINET_TYPES, &mut answers.cabinet_type)?,
            Step::DetectionIo => self.choose(DETECTION_IO, &mut answers.detection_io)?,
            Step::TlsConnection => self.choose(TLS_CONNECTIONS, &mut answers.tls_connection)?,
            Step::IntersectionPhasing => self.upload(&mut answers.intersection_phasing)?,
            Step::SignalTiming => self.upload(&mut answers.signal_timing)?,
            Step::Equipment => self.quantities(EQUIPMENT, &mut answers.equipment)?,
            Step::AuxiliaryEquipment => {
                self.quantities(AUXILIARY_EQUIPMENT, &mut answers.auxiliary_equipment)?
            }
            Step::Review => {
                write!(self.output, "{}", render_review(answers))?;
                true
            }
            Step::Authorization => self.contact(&mut answers.contact)?,
        };
        if !completed {
            return Ok(Navigation::Quit);
        }
        self.navigation(step)
    }

    /// Read one trimmed line after showing `prompt`. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn choose(&mut self, options: &[&str], answer: &mut ChoiceAnswer) -> io::Result<bool> {
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {option}", index + 1)?;
        }
        if !answer.selection().is_empty() {
            writeln!(self.output, "Current: {}", answer.resolved())?;
        }
        loop {
            let Some(input) = self.ask(&format!("Choice [1-{}]: ", options.len()))? else {
                return Ok(false);
            };
            if input.is_empty() {
                break;
            }
            let picked = input
                .parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|index| options.get(index));
            match picked {
                Some(option) => {
                    answer.select(*option);
                    break;
                }
                None => writeln!(
                    self.output,
                    "Enter a number between 1 and {}.",
                    options.len()
                )?,
            }
        }
        if answer.is_other() {
            let Some(text) = self.ask("Please specify: ")? else {
                return Ok(false);
            };
            if !text.is_empty() {
                answer.set_other(text);
            }
        }
        Ok(true)
    }

    fn upload(&mut self, slot: &mut Option<AttachmentDraft>) -> io::Result<bool> {
        let current = slot.as_ref().map_or(NO_FILE, |draft| draft.file_name.as_str());
        writeln!(self.output, "Current: {current}")?;
        loop {
            let Some(input) = self.ask("File path (blank keeps, '-' clears): ")? else {
                return Ok(false);
            };
            match input.as_str() {
                "" => return Ok(true),
                "-" => {
                    *slot = None;
                    return Ok(true);
                }
                path => match AttachmentDraft::from_path(Path::new(path)) {
                    Ok(draft) => {
                        writeln!(
                            self.output,
                            "Attached {} ({} bytes)",
                            draft.file_name,
                            draft.bytes.len()
                        )?;
                        *slot = Some(draft);
                        return Ok(true);
                    }
                    Err(err) => writeln!(self.output, "Cannot read {path}: {err}")?,
                },
            }
        }
    }

    fn quantities(&mut self, items: &[&str], quantities: &mut Quantities) -> io::Result<bool> {
        for item in items {
            let current = quantities.get(item).unwrap_or(0);
            let Some(input) = self.ask(&format!("{item} [{current}]: "))? else {
                return Ok(false);
            };
            if !input.is_empty() {
                quantities.set_from_input(item, &input);
            }
        }
        Ok(true)
    }

    fn contact(&mut self, contact: &mut Contact) -> io::Result<bool> {
        let fields: [(&str, &mut String); 6] = [
            ("Distributor", &mut contact.distributor),
            ("End-User", &mut contact.end_user),
            ("Address", &mut contact.address),
            ("City", &mut contact.city),
            ("State", &mut contact.state),
            ("ZIP", &mut contact.zip),
        ];
        for (label, value) in fields {
            let Some(input) = self.ask(&format!("{label} [{value}]: "))? else {
                return Ok(false);
            };
            if !input.is_empty() {
                *value = input;
            }
        }
        Ok(true)
    }

    fn navigation(&mut self, step: Step) -> io::Result<Navigation> {
        let forward = if step.is_last() { "submit" } else { "next" };
        loop {
            let Some(input) = self.ask(&format!("[Enter] {forward}, [b] back, [q] quit: "))?
            else {
                return Ok(Navigation::Quit);
            };
            match input.to_ascii_lowercase().as_str() {
                "" => return Ok(Navigation::Next),
                "b" | "back" => return Ok(Navigation::Previous),
                "q" | "quit" => return Ok(Navigation::Quit),
                _ => writeln!(self.output, "Unrecognised choice '{input}'.")?,
            }
        }
    }
}
