//! Doble en memoria del proveedor de identidad, solo para pruebas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::identity::{IdentityError, IdentityProvider, SelfUpdate, Session};

#[derive(Default)]
struct Interior {
    // correo -> (contraseña, id)
    cuentas: HashMap<String, (String, String)>,
    // token -> id
    sesiones: HashMap<String, String>,
    proximo: u32,
    fallar_sign_up: bool,
    codigos_emitidos: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MemIdentity {
    interior: Arc<Mutex<Interior>>,
}

impl MemIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallar_sign_up(&self) {
        self.interior.lock().unwrap().fallar_sign_up = true;
    }

    /// Registra una cuenta y devuelve (id, token de sesión).
    pub fn sembrar_cuenta(&self, correo: &str, contrasenia: &str) -> (String, String) {
        let mut interior = self.interior.lock().unwrap();
        interior.proximo += 1;
        let id = format!("usuario-{}", interior.proximo);
        let token = format!("sesion-{}", interior.proximo);
        interior
            .cuentas
            .insert(correo.to_string(), (contrasenia.to_string(), id.clone()));
        interior.sesiones.insert(token.clone(), id.clone());
        (id, token)
    }

    pub fn codigos_emitidos(&self) -> Vec<String> {
        self.interior.lock().unwrap().codigos_emitidos.clone()
    }
}

impl IdentityProvider for MemIdentity {
    async fn sign_up(&self, correo: &str, contrasenia: &str) -> Result<String, IdentityError> {
        let mut interior = self.interior.lock().unwrap();
        if interior.fallar_sign_up {
            return Err(IdentityError::Proveedor("alta rechazada".to_string()));
        }
        if interior.cuentas.contains_key(correo) {
            return Err(IdentityError::Rechazado("el correo ya está registrado".to_string()));
        }
        interior.proximo += 1;
        let id = format!("usuario-{}", interior.proximo);
        interior
            .cuentas
            .insert(correo.to_string(), (contrasenia.to_string(), id.clone()));
        Ok(id)
    }

    async fn sign_in(&self, correo: &str, contrasenia: &str) -> Result<Session, IdentityError> {
        let mut interior = self.interior.lock().unwrap();
        let id = match interior.cuentas.get(correo) {
            Some((guardada, id)) if guardada == contrasenia => id.clone(),
            _ => {
                return Err(IdentityError::Rechazado(
                    "correo o contraseña inválidos".to_string(),
                ));
            }
        };
        interior.proximo += 1;
        let token = format!("sesion-{}", interior.proximo);
        interior.sesiones.insert(token.clone(), id.clone());
        Ok(Session {
            access_token: token,
            expires_in: 3600,
            user_id: id,
        })
    }

    async fn verify_session(&self, token: &str) -> Result<String, IdentityError> {
        self.interior
            .lock()
            .unwrap()
            .sesiones
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rechazado("sesión inválida".to_string()))
    }

    async fn update_self(&self, token: &str, cambios: SelfUpdate) -> Result<String, IdentityError> {
        let mut interior = self.interior.lock().unwrap();
        let id = interior
            .sesiones
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rechazado("sesión inválida".to_string()))?;

        if let Some(nuevo_correo) = cambios.email {
            let anterior = interior
                .cuentas
                .iter()
                .find(|(_, (_, cid))| *cid == id)
                .map(|(correo, _)| correo.clone());
            if let Some(anterior) = anterior {
                let (contrasenia, _) = interior.cuentas.remove(&anterior).unwrap();
                interior.cuentas.insert(nuevo_correo, (contrasenia, id.clone()));
            }
        }
        if let Some(nueva) = cambios.password {
            for (_, (contrasenia, cid)) in interior.cuentas.iter_mut() {
                if *cid == id {
                    *contrasenia = nueva.clone();
                }
            }
        }
        Ok(id)
    }

    async fn delete_by_id(&self, user_id: &str) -> Result<(), IdentityError> {
        let mut interior = self.interior.lock().unwrap();
        interior.cuentas.retain(|_, (_, id)| id != user_id);
        interior.sesiones.retain(|_, id| id != user_id);
        Ok(())
    }

    async fn issue_one_time_code(&self, correo: &str) -> Result<(), IdentityError> {
        let mut interior = self.interior.lock().unwrap();
        if !interior.cuentas.contains_key(correo) {
            return Err(IdentityError::Rechazado("correo no registrado".to_string()));
        }
        interior.codigos_emitidos.push(correo.to_string());
        Ok(())
    }
}
