//! Line-oriented menu driver
//!
//! Drives an [`AppState`] from any reader and writer, one screen interaction
//! at a time. An empty answer on a calculator's first prompt goes back to the
//! main menu; end of input ends the session.

use chrono::NaiveDate;
use std::io::{self, BufRead, Write};

use super::{AppState, Screen, View};
use crate::render;
use crate::summarizer::{self, Summarizer};

/// Date format accepted at the prompts
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user quits or input ends
    pub async fn run<S>(&mut self, state: &mut AppState, summarizer: &S) -> io::Result<()>
    where
        S: Summarizer + ?Sized,
    {
        while state.is_running() {
            match state.screen() {
                Screen::MainMenu => self.main_menu(state)?,
                Screen::TaxCalculator => self.tax_screen(state)?,
                Screen::PolicyPeriodCalculator => self.policy_screen(state)?,
                Screen::AiSummarizer => self.summarizer_screen(state, summarizer).await?,
            }
        }
        self.output.flush()
    }

    /// Next line without its line ending, `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        self.read_line()
    }

    fn header(&mut self, screen: Screen) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "== {} ==", screen.title())
    }

    fn main_menu(&mut self, state: &mut AppState) -> io::Result<()> {
        self.header(Screen::MainMenu)?;
        writeln!(self.output, "{}", Screen::MainMenu.description())?;
        for (i, screen) in Screen::CALCULATORS.iter().enumerate() {
            writeln!(self.output, "  {}) {} - {}", i + 1, screen.title(), screen.description())?;
        }
        writeln!(self.output, "  0) Çıkış")?;

        let choice = match self.prompt("Seçim")? {
            Some(choice) => choice,
            None => {
                state.quit();
                return Ok(());
            }
        };

        match choice.trim() {
            "0" | "q" => state.quit(),
            other => match other.parse::<usize>() {
                Ok(n) if (1..=Screen::CALCULATORS.len()).contains(&n) => {
                    state.open(Screen::CALCULATORS[n - 1]);
                }
                _ => writeln!(self.output, "Geçersiz seçim.")?,
            },
        }
        Ok(())
    }

    fn tax_screen(&mut self, state: &mut AppState) -> io::Result<()> {
        self.header(Screen::TaxCalculator)?;
        let line = match self.prompt("Toplam Tutar (₺) [boş: menüye dön]")? {
            None => {
                state.quit();
                return Ok(());
            }
            Some(line) if line.trim().is_empty() => {
                state.back();
                return Ok(());
            }
            Some(line) => line,
        };

        let rates = state.config.tax;
        if let View::Tax(form) = state.view_mut() {
            form.set_amount(&line);
            form.submit(&rates);

            if let Some(result) = &form.result {
                write!(self.output, "{}", render::render_tax(result, &rates))?;
            }
            if let Some(error) = &form.error {
                writeln!(self.output, "{}", error)?;
            }
        }
        Ok(())
    }

    fn policy_screen(&mut self, state: &mut AppState) -> io::Result<()> {
        self.header(Screen::PolicyPeriodCalculator)?;

        let start = match self.prompt("Başlangıç Tarihi (YYYY-AA-GG) [boş: menüye dön]")? {
            None => {
                state.quit();
                return Ok(());
            }
            Some(line) if line.trim().is_empty() => {
                state.back();
                return Ok(());
            }
            Some(line) => line,
        };

        let answers = (
            self.prompt("Bitiş Tarihi (YYYY-AA-GG)")?,
            self.prompt("Toplam Tutar (₺)")?,
            self.prompt("Binek araç mı? (Gider kısıtlaması uygula) [e/H]")?,
        );
        let (end, amount, passenger) = match answers {
            (Some(end), Some(amount), Some(passenger)) => (end, amount, passenger),
            _ => {
                state.quit();
                return Ok(());
            }
        };

        let split = state.config.deduction_split();
        let deductible_share = state.config.deductible_share;
        if let View::Policy(form) = state.view_mut() {
            form.start = parse_date(&start);
            form.end = parse_date(&end);
            form.set_amount(&amount);
            form.is_passenger_car = is_yes(&passenger);
            form.submit(split);

            if let Some(results) = &form.results {
                write!(
                    self.output,
                    "{}",
                    render::render_policy_periods(results, deductible_share)
                )?;
            }
            if let Some(error) = &form.error {
                writeln!(self.output, "{}", error)?;
            }
        }
        Ok(())
    }

    async fn summarizer_screen<S>(&mut self, state: &mut AppState, summarizer: &S) -> io::Result<()>
    where
        S: Summarizer + ?Sized,
    {
        self.header(Screen::AiSummarizer)?;
        writeln!(
            self.output,
            "Özetlenecek Metin (bitirmek için boş satır, hiç yazmazsanız menüye döner):"
        )?;

        let mut lines = Vec::new();
        let mut reached_eof = false;
        loop {
            match self.read_line()? {
                Some(line) if line.is_empty() => break,
                Some(line) => lines.push(line),
                None => {
                    reached_eof = true;
                    break;
                }
            }
        }

        if lines.is_empty() {
            if reached_eof {
                state.quit();
            } else {
                state.back();
            }
            return Ok(());
        }

        if let View::Summarizer(form) = state.view_mut() {
            form.input = lines.join("\n");
            if !form.can_submit() {
                return Ok(());
            }

            if summarizer::preflight(summarizer, &form.input).is_ok() {
                writeln!(self.output, "Özetleniyor...")?;
                self.output.flush()?;
            }
            form.submit(summarizer).await;

            if let Some(result) = &form.result {
                writeln!(self.output, "Özet Sonucu:")?;
                writeln!(self.output, "{}", result)?;
            }
            if let Some(error) = &form.error {
                writeln!(self.output, "{}", error)?;
            }
        }

        if reached_eof {
            state.quit();
        }
        Ok(())
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "e" | "evet" | "y" | "yes")
}
