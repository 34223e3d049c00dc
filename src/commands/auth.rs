use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};
use vault_client::auth::{AuthForm, AuthMode};
use vault_client::{ApiClient, Route};

pub fn login(api: &ApiClient, email: String, password: Option<String>) -> Result<()> {
    let mut form = AuthForm::new(AuthMode::SignIn);
    form.email = email;
    form.password = read_password(password)?;
    submit(api, form)
}

pub fn signup(
    api: &ApiClient,
    first_name: String,
    last_name: String,
    email: String,
    password: Option<String>,
) -> Result<()> {
    let mut form = AuthForm::new(AuthMode::SignUp);
    form.first_name = first_name;
    form.last_name = last_name;
    form.email = email;
    form.password = read_password(password)?;
    submit(api, form)
}

fn submit(api: &ApiClient, mut form: AuthForm) -> Result<()> {
    let route = if form.mode == AuthMode::SignUp { Route::Signup } else { Route::Login };
    api.session().navigate(route);

    match form.submit(api) {
        Ok(landed) => {
            println!("Signed in as {}.", form.email);
            println!("Continue at {landed}: try `vault feed` or `vault repo list`.");
            Ok(())
        }
        Err(_) => {
            let hint = match form.mode.toggled() {
                Route::Signup => "No account yet? Use `vault signup`.",
                _ => "Already registered? Use `vault login`.",
            };
            bail!("{}\n{hint}", form.error.unwrap_or_default())
        }
    }
}

pub fn logout(api: &ApiClient) -> Result<()> {
    api.session().logout()?;
    println!("Logged out. Run `vault login` to sign in again.");
    Ok(())
}

pub fn verify(api: &ApiClient) -> Result<()> {
    if !api.session().verify_token(api) {
        bail!("session is no longer valid, run `vault login`");
    }
    println!("Session is active.");
    Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
