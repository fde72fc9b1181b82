pub mod run_manager;
