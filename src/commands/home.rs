use anyhow::Result;
use vault_client::{ApiClient, AuthState, Route};

pub fn run(api: &ApiClient) -> Result<()> {
    let session = api.session();
    session.navigate(Route::Landing);
    let state = session.state();

    println!("Vault: share posts, keep repositories, browse commits.");
    println!();
    match state.auth {
        AuthState::Authenticated => println!("You are signed in."),
        AuthState::Expired => println!("Your session expired. Sign in again with `vault login`."),
        _ => println!("You are not signed in. Use `vault login` or `vault signup`."),
    }
    println!();

    println!("{:<26} {:<10} Commands", "Route", "Access");
    super::separator(70);
    for route in Route::ALL {
        let access = match (route.requires_auth(), state.authenticated) {
            (false, _) => "open",
            (true, true) => "ok",
            (true, false) => "login",
        };
        println!("{:<26} {access:<10} {}", route.path(), commands_for(route));
    }

    Ok(())
}

fn commands_for(route: Route) -> &'static str {
    match route {
        Route::Landing => "vault home",
        Route::Login => "vault login, vault logout, vault verify",
        Route::Signup => "vault signup",
        Route::Dashboard => "vault feed, post, like, comment, comments, repo",
        Route::GitRepositoryManager => "vault git",
    }
}
