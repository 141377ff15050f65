use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use tripwise_core::config::{Config, get_config_path};

const BANNER: &str = r"
    -------------------------------------

     _        _             _
    | |_ _ __(_)_ ____ __ _(_)___  ___
    | __| '__| | '_ \ \ /\ / / / __|/ _ \
    | |_| |  | | |_) \ V  V /| \__ \  __/
     \__|_|  |_| .__/ \_/\_/ |_|___/\___|
               |_|

    -------------------------------------
";

const TOTAL_STEPS: usize = 4;

struct ProviderChoice {
    id: &'static str,
    label: &'static str,
    models: &'static [&'static str],
    needs_key: bool,
}

const PROVIDERS: &[ProviderChoice] = &[
    ProviderChoice {
        id: "openai",
        label: "OpenAI",
        models: &["gpt-4o-mini", "gpt-4o", "gpt-5-mini", "gpt-5"],
        needs_key: true,
    },
    ProviderChoice {
        id: "openrouter",
        label: "OpenRouter",
        models: &[
            "openai/gpt-4o-mini",
            "anthropic/claude-sonnet-4",
            "meta-llama/llama-3.3-70b-instruct",
        ],
        needs_key: true,
    },
    ProviderChoice {
        id: "ollama",
        label: "Ollama (local)",
        models: &["llama3.2", "qwen2.5", "mistral"],
        needs_key: false,
    },
];

fn print_step(step: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, TOTAL_STEPS, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<&'static ProviderChoice> {
    let labels: Vec<&str> = PROVIDERS.iter().map(|p| p.label).collect();
    let selection = Select::new()
        .with_prompt("Select your LLM provider")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(&PROVIDERS[selection])
}

fn setup_api_key(provider: &ProviderChoice) -> Result<String> {
    if !provider.needs_key {
        println!(
            "  {} {} runs locally, no key needed",
            style("✓").green(),
            provider.label
        );
        return Ok(String::new());
    }

    let api_key = Password::new()
        .with_prompt(format!("Enter your {} API key", provider.label))
        .interact()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    Ok(api_key.trim().to_string())
}

fn setup_model(provider: &ProviderChoice) -> Result<String> {
    let selection = Select::new()
        .with_prompt("Select your model")
        .items(provider.models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(provider.models[selection].to_string())
}

fn optional_key(service: &str, env_var: &str) -> Result<String> {
    let wanted = Confirm::new()
        .with_prompt(format!(
            "Add a {} key now? (you can also set {} later)",
            service, env_var
        ))
        .default(true)
        .interact()
        .context("Failed to read answer")?;

    if !wanted {
        return Ok(String::new());
    }

    let key = Password::new()
        .with_prompt(format!("Enter your {} API key", service))
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;

    Ok(key.trim().to_string())
}

fn setup_max_iterations(default: usize) -> Result<usize> {
    let value: usize = Input::new()
        .with_prompt("Maximum reasoning steps per plan")
        .default(default)
        .validate_with(|n: &usize| -> Result<(), &str> {
            if *n == 0 {
                Err("must be at least 1")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read iteration limit")?;

    Ok(value)
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to Tripwise!").white().bold());
    println!(
        "  {}",
        style("This wizard connects the planner to a model and the travel tools.").dim()
    );
    println!();

    let mut config = Config::default();

    print_step(1, "Model Provider");
    let provider = setup_provider()?;
    config.provider = Some(provider.id.to_string());
    config.api_key = setup_api_key(provider)?;

    print_step(2, "Model Selection");
    config.model = setup_model(provider)?;

    print_step(3, "Travel Tools");
    config.search.api_key = optional_key("Tavily search", "TAVILY_API_KEY")?;
    config.weather.api_key = optional_key("OpenWeatherMap", "OPENWEATHERMAP_API_KEY")?;
    if config.weather.api_key.is_empty() {
        println!(
            "  {} Without a weather key the planner falls back to seasonal averages from search",
            style("!").yellow()
        );
    }

    print_step(4, "Planning Limits");
    config.max_iterations = setup_max_iterations(config.max_iterations)?;

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("tripwise plan --demo").cyan().bold()
    );
    println!();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_are_known_to_the_factory() {
        for choice in PROVIDERS {
            let config = Config {
                provider: Some(choice.id.to_string()),
                api_key: "test-key".to_string(),
                model: choice.models[0].to_string(),
                ..Default::default()
            };
            assert!(tripwise_core::providers::create_provider(&config).is_ok());
        }
    }
}
