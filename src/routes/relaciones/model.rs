use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AsignarMedicoRequest {
    pub medico_id: String,
    pub paciente_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AsignarCuidadorRequest {
    pub cuidador_id: String,
    pub paciente_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuitarCuidadorRequest {
    pub cuidador_id: String,
    pub paciente_id: String,
}

#[derive(Debug, Serialize)]
pub struct MiPacienteResponse {
    pub paciente_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VinculoOk {}
