pub mod score_cmd;
