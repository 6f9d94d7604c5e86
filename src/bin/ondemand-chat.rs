//! Create a chat session and submit one query to the on-demand chat API.
//!
//! # Usage
//!
//! ```bash
//! # Synchronous answer, key from the environment
//! ONDEMAND_API_KEY=... ondemand-chat "What is the capital of France?"
//!
//! # Streamed answer with context metadata echoed back
//! ondemand-chat --response-mode stream --context userId=1,name=John --query "Hello"
//!
//! # Layer flags over a YAML file
//! ondemand-chat --config chat.yaml --temperature 0.2 "Summarise today's news"
//! ```
//!
//! The final JSON goes to stdout; session details, logs and errors go to stderr.  The exit
//! status is 0 on success, 1 for configuration errors, 2 when no session could be created,
//! 3 for transport failures, 4 for HTTP status failures, 5 when the stream breaks, 6 when
//! a response cannot be decoded and 7 when the result cannot be written.  `--lenient-exit`
//! turns every code but 1 into 0.

use arrrg::CommandLine;

use ondemand_chat::chat::{ChatArgs, ChatConfig, ChatRun};
use ondemand_chat::error::EXIT_CONFIGURATION;
use ondemand_chat::{PlainTextRenderer, Renderer, init_logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let (args, free) =
        ChatArgs::from_command_line_relaxed("ondemand-chat [OPTIONS] [QUERY]...");
    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    if let Err(err) = init_logging(args.verbose) {
        renderer.print_error(&err.to_string());
    }

    let config = match ChatConfig::from_args(args, free) {
        Ok(config) => config,
        Err(err) => {
            renderer.print_error(&err.to_string());
            std::process::exit(EXIT_CONFIGURATION);
        }
    };

    let outcome = match ChatRun::new(config.clone()) {
        Ok(run) => run.run(&mut renderer).await.map(|_| ()),
        Err(err) => Err(err),
    };
    if let Err(err) = &outcome {
        renderer.print_error(&err.to_string());
    }
    std::process::exit(config.exit_code(&outcome));
}
