mod helpers;

mod auth;
mod orders;
mod push;
mod reviews;
mod transitions;
mod wallet;
