pub mod email;
pub mod identity;
pub mod token_manager;

pub use email::{build_email_sender, EmailSender, EmailTemplates, NoopEmailSender, SmtpEmailSender};
pub use identity::{
    IdentityOptions, IdentityService, LoginInput, LoginOutcome, RegisterInput, RegistrationOutcome,
    ResetPasswordInput, UpdateProfileInput,
};
pub use token_manager::TokenManager;
