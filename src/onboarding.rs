use chat_backend::OnboardingProfile;

/// Wizard position. The first three steps collect free-form answers; the
/// themes step doubles as the finish gate. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Profession,
    Hobbies,
    Interests,
    Themes,
    Submitted,
}

/// Four-step onboarding wizard accumulating an [`OnboardingProfile`].
///
/// Forward movement is gated on per-step completeness; backward movement is
/// always allowed except from the first step. All collected state survives a
/// failed submission so the user can retry from the last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingWizard {
    step: WizardStep,
    profile: OnboardingProfile,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::Profession,
            profile: OnboardingProfile::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn profile(&self) -> &OnboardingProfile {
        &self.profile
    }

    pub fn set_profession(&mut self, profession: &str) {
        self.profile.profession = profession.trim().to_string();
    }

    /// Adds a tag to the current step's list. Input is trimmed; blanks are
    /// ignored. Duplicates are allowed on purpose.
    pub fn add_entry(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }

        match self.step {
            WizardStep::Profession => self.profile.profession = entry.to_string(),
            WizardStep::Hobbies => self.profile.hobbies.push(entry.to_string()),
            WizardStep::Interests => self.profile.interests.push(entry.to_string()),
            WizardStep::Themes => self.profile.themes.push(entry.to_string()),
            WizardStep::Submitted => {}
        }
    }

    /// Removes the tag at `index` from the current step's list, if present.
    pub fn remove_entry(&mut self, index: usize) {
        let list = match self.step {
            WizardStep::Hobbies => &mut self.profile.hobbies,
            WizardStep::Interests => &mut self.profile.interests,
            WizardStep::Themes => &mut self.profile.themes,
            WizardStep::Profession | WizardStep::Submitted => return,
        };

        if index < list.len() {
            list.remove(index);
        }
    }

    /// Whether the current step has enough content to move forward.
    pub fn step_complete(&self) -> bool {
        match self.step {
            WizardStep::Profession => !self.profile.profession.trim().is_empty(),
            WizardStep::Hobbies => !self.profile.hobbies.is_empty(),
            WizardStep::Interests => !self.profile.interests.is_empty(),
            WizardStep::Themes => !self.profile.themes.is_empty(),
            WizardStep::Submitted => false,
        }
    }

    /// Moves forward one step. Returns false when gated by completeness or
    /// already at the finish step.
    pub fn advance(&mut self) -> bool {
        if !self.step_complete() {
            return false;
        }

        self.step = match self.step {
            WizardStep::Profession => WizardStep::Hobbies,
            WizardStep::Hobbies => WizardStep::Interests,
            WizardStep::Interests => WizardStep::Themes,
            WizardStep::Themes | WizardStep::Submitted => return false,
        };

        true
    }

    /// Moves back one step. Not possible from the first step or after
    /// submission.
    pub fn back(&mut self) -> bool {
        self.step = match self.step {
            WizardStep::Profession | WizardStep::Submitted => return false,
            WizardStep::Hobbies => WizardStep::Profession,
            WizardStep::Interests => WizardStep::Hobbies,
            WizardStep::Themes => WizardStep::Interests,
        };

        true
    }

    /// The wizard is submittable from the themes step once at least one
    /// theme is present.
    pub fn can_finish(&self) -> bool {
        self.step == WizardStep::Themes && !self.profile.themes.is_empty()
    }

    /// Marks the wizard terminal after the profile was accepted.
    pub fn mark_submitted(&mut self) {
        self.step = WizardStep::Submitted;
    }
}
