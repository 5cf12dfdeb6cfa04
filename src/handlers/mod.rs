pub mod biofeedback;
pub mod health;
