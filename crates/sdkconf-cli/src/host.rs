use sdkconf_core::{AssembledConfig, SdkError, SdkHost};
use std::cell::RefCell;

/// SDK host that records the hand-off instead of calling a real SDK.
pub struct DryRunSdk {
    available: bool,
    existing_apps: usize,
    initialized: RefCell<Option<AssembledConfig>>,
}

impl DryRunSdk {
    pub fn new(available: bool, existing_apps: usize) -> Self {
        Self {
            available,
            existing_apps,
            initialized: RefCell::new(None),
        }
    }

    pub fn take_initialized(&self) -> Option<AssembledConfig> {
        self.initialized.borrow_mut().take()
    }
}

impl SdkHost for DryRunSdk {
    fn is_available(&self) -> bool {
        self.available
    }

    fn app_count(&self) -> usize {
        self.existing_apps + usize::from(self.initialized.borrow().is_some())
    }

    fn initialize_app(&self, config: &AssembledConfig) -> Result<(), SdkError> {
        let mut slot = self.initialized.borrow_mut();
        if slot.is_some() {
            return Err(SdkError::Rejected("duplicate app".into()));
        }
        *slot = Some(config.clone());
        Ok(())
    }
}
