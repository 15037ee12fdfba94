pub mod auth;
pub mod library;
pub mod settings;
pub mod tenancy;

#[cfg(test)]
mod tests;
