// Console event loop - One task owns all state, each event runs to completion
use crate::infrastructure::stream_client::StreamClient;
use crate::presentation::app_state::AppState;
use crate::presentation::commands::Command;
use crate::presentation::handlers::{
    CallOutcome, Flow, Services, handle_command, handle_outcome, handle_stream_event,
};
use crate::presentation::view::{HELP, render_readout, render_screen};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

pub struct Console {
    state: AppState,
    services: Services,
    stream: StreamClient,
}

impl Console {
    pub fn new(state: AppState, services: Services, stream: StreamClient) -> Self {
        Self {
            state,
            services,
            stream,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut subscription = self.stream.subscribe();
        let mut tasks: JoinSet<CallOutcome> = JoinSet::new();

        for command in [Command::History, Command::Status] {
            handle_command(&mut self.state, &self.services, &mut tasks, command);
        }
        println!("{}", render_screen(&self.state));

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = true;
        let mut stream_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = subscription.recv(), if stream_open => match event {
                    Some(event) => {
                        if handle_stream_event(&mut self.state, event) {
                            println!("{}", render_readout(&self.state.display.render(), &self.state.link));
                        }
                    }
                    None => {
                        tracing::warn!(url = %self.stream.url(), "Telemetry stream is gone for good");
                        stream_open = false;
                    }
                },
                line = input.next_line(), if input_open => match line {
                    Ok(Some(line)) => match line.parse::<Command>() {
                        Ok(command) => match handle_command(&mut self.state, &self.services, &mut tasks, command) {
                            Flow::Quit => break,
                            Flow::Help => println!("{}", HELP),
                            Flow::Redraw => println!("{}", render_screen(&self.state)),
                        },
                        Err(e) => {
                            self.state.fail(e.to_string());
                            println!("{}", render_screen(&self.state));
                        }
                    },
                    Ok(None) => {
                        tracing::info!("Input closed, press Ctrl-C to quit");
                        input_open = false;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read input");
                        input_open = false;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Ok(outcome) => {
                        handle_outcome(&mut self.state, outcome);
                        println!("{}", render_screen(&self.state));
                    }
                    Err(e) => tracing::error!(error = %e, "Outbound call task failed"),
                },
                _ = &mut ctrl_c => break,
            }
        }

        tracing::info!("Shutting down");
        subscription.close().await;
        tasks.shutdown().await;
        Ok(())
    }
}
