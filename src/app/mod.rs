//! Per-session application state
//!
//! The session is always on exactly one screen, and the screen owns its
//! form. Leaving a calculator drops its form, so reopening it starts clean.

mod forms;
pub mod terminal;

pub use forms::{PolicyForm, SummarizerForm, TaxForm};

use crate::config::AppConfig;

/// The closed set of screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    TaxCalculator,
    PolicyPeriodCalculator,
    AiSummarizer,
}

impl Screen {
    /// Title shown at the top of the screen
    pub fn title(&self) -> &'static str {
        match self {
            Screen::MainMenu => "Hesaplama Araçları",
            Screen::TaxCalculator => "ÖTV & KDV Ayırıcı",
            Screen::PolicyPeriodCalculator => "Poliçe Dönem Hesaplayıcı",
            Screen::AiSummarizer => "AI Metin Özetleyici",
        }
    }

    /// One-line description used in the main menu
    pub fn description(&self) -> &'static str {
        match self {
            Screen::MainMenu => "Lütfen yapmak istediğiniz işlemi seçin.",
            Screen::TaxCalculator => "Toplam tutar içerisinden ÖTV ve KDV'yi ayırır.",
            Screen::PolicyPeriodCalculator => "Tarih aralığına göre tutarı çeyreklere dağıtır.",
            Screen::AiSummarizer => "Uzun metinleri yapay zeka ile özetler.",
        }
    }

    /// Calculators in menu order
    pub const CALCULATORS: [Screen; 3] = [
        Screen::TaxCalculator,
        Screen::PolicyPeriodCalculator,
        Screen::AiSummarizer,
    ];
}

/// Current screen together with the state it owns
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    MainMenu,
    Tax(TaxForm),
    Policy(PolicyForm),
    Summarizer(SummarizerForm),
}

impl View {
    pub fn screen(&self) -> Screen {
        match self {
            View::MainMenu => Screen::MainMenu,
            View::Tax(_) => Screen::TaxCalculator,
            View::Policy(_) => Screen::PolicyPeriodCalculator,
            View::Summarizer(_) => Screen::AiSummarizer,
        }
    }

    fn fresh(screen: Screen) -> Self {
        match screen {
            Screen::MainMenu => View::MainMenu,
            Screen::TaxCalculator => View::Tax(TaxForm::default()),
            Screen::PolicyPeriodCalculator => View::Policy(PolicyForm::default()),
            Screen::AiSummarizer => View::Summarizer(SummarizerForm::default()),
        }
    }
}

/// One user's session
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    view: View,
    running: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            view: View::MainMenu,
            running: true,
        }
    }

    pub fn screen(&self) -> Screen {
        self.view.screen()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open a screen with fresh form state
    pub fn open(&mut self, screen: Screen) {
        log::debug!("{:?} -> {:?}", self.screen(), screen);
        self.view = View::fresh(screen);
    }

    /// Return to the main menu from any calculator
    pub fn back(&mut self) {
        self.open(Screen::MainMenu);
    }

    /// End the session
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::TaxRates;

    #[test]
    fn test_starts_on_main_menu() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(state.screen(), Screen::MainMenu);
        assert!(state.is_running());
    }

    #[test]
    fn test_open_and_back() {
        let mut state = AppState::new(AppConfig::default());
        for screen in Screen::CALCULATORS {
            state.open(screen);
            assert_eq!(state.screen(), screen);
            state.back();
            assert_eq!(state.screen(), Screen::MainMenu);
        }
    }

    #[test]
    fn test_reopening_discards_form_state() {
        let mut state = AppState::new(AppConfig::default());
        state.open(Screen::TaxCalculator);
        if let View::Tax(form) = state.view_mut() {
            form.set_amount("121");
            form.submit(&TaxRates::default());
        }
        state.back();
        state.open(Screen::TaxCalculator);

        assert_eq!(state.view(), &View::Tax(TaxForm::default()));
    }

    #[test]
    fn test_quit() {
        let mut state = AppState::new(AppConfig::default());
        state.quit();
        assert!(!state.is_running());
    }
}
