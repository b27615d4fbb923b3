pub mod cli_app;
